use std::collections::HashMap;

use actix_multipart::Multipart;
use futures_util::TryStreamExt;

use crate::error::AppError;
use crate::storage::UploadedFile;

const MAX_TEXT_BYTES: usize = 64 * 1024;

/// A fully buffered multipart body.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

/// Bracketed keys (`guestInfo[fullName]`) and dotted keys
/// (`guestInfo.fullName`) address the same field.
pub fn normalize_key(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '[' => key.push('.'),
            ']' => {}
            c => key.push(c),
        }
    }
    key
}

impl FormData {
    pub fn insert_text(&mut self, key: &str, value: impl Into<String>) {
        self.fields.insert(normalize_key(key), value.into());
    }

    pub fn insert_file(&mut self, key: &str, file: UploadedFile) {
        self.files.insert(normalize_key(key), file);
    }

    /// Trimmed text value; blank values count as absent.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn has(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn file(&self, key: &str) -> Option<&UploadedFile> {
        self.files.get(key)
    }
}

/// Buffer every part of `payload`. File parts larger than `max_file_bytes`
/// fail fast instead of being read to the end.
pub async fn read_form(mut payload: Multipart, max_file_bytes: usize) -> Result<FormData, actix_web::Error> {
    let mut form = FormData::default();

    while let Some(mut field) = payload.try_next().await? {
        let name = match field.name() {
            Some(name) => name.to_owned(),
            None => continue,
        };
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_owned);
        let content_type = field.content_type().map(|m| m.essence_str().to_owned());

        let limit = if file_name.is_some() { max_file_bytes } else { MAX_TEXT_BYTES };
        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            if bytes.len() + chunk.len() > limit {
                return Err(match file_name {
                    Some(_) => AppError::FileTooLarge { limit }.into(),
                    None => AppError::field(&normalize_key(&name), "The value is too long.").into(),
                });
            }
            bytes.extend_from_slice(&chunk);
        }

        match file_name {
            // browsers send an empty part when no file was picked
            Some(file_name) if file_name.is_empty() && bytes.is_empty() => {}
            Some(file_name) => form.insert_file(
                &name,
                UploadedFile {
                    file_name,
                    content_type,
                    bytes,
                },
            ),
            None => match String::from_utf8(bytes) {
                Ok(text) => form.insert_text(&name, text),
                Err(_) => {
                    return Err(AppError::field(&normalize_key(&name), "The value must be valid UTF-8.").into());
                }
            },
        }
    }

    Ok(form)
}
