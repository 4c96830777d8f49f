//! Boundary to the external image host. Uploads hand back a public URL
//! and an opaque delete handle; nothing is stored on this server.

use crate::shared::util::config;

use serde_json::Value;

#[derive(Debug)]
pub enum ImageHostError {
    Http(reqwest::Error),
    BadResponse
}

impl From<reqwest::Error> for ImageHostError {
    fn from(err: reqwest::Error) -> ImageHostError {
        ImageHostError::Http(err)
    }
}

#[derive(Clone)]
pub struct UploadedImage {
    pub url: String,
    pub delete_handle: String
}

#[derive(Clone)]
pub struct ImageHostClient {
    http: reqwest::Client
}

impl ImageHostClient {
    pub fn new() -> ImageHostClient {
        ImageHostClient { http: reqwest::Client::new() }
    }

    pub async fn upload(&self, data: Vec<u8>, filename: &str) -> Result<UploadedImage, ImageHostError> {
        let config = config::get_config();

        let part = reqwest::multipart::Part::bytes(data).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("image", part);

        let response = self.http.post(&config.storage.upload_url)
            .query(&[("key", config.storage.api_key.as_str())])
            .multipart(form)
            .send().await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        let url = body["data"]["url"].as_str().ok_or(ImageHostError::BadResponse)?;
        let delete_handle = body["data"]["delete_url"].as_str().ok_or(ImageHostError::BadResponse)?;
        Ok(UploadedImage {
            url: url.to_string(),
            delete_handle: delete_handle.to_string()
        })
    }

    /// The handle is the host's single-use delete URL for the image
    pub async fn delete(&self, delete_handle: &str) -> Result<(), ImageHostError> {
        if delete_handle.is_empty() {
            return Ok(());
        }
        self.http.get(delete_handle).send().await?.error_for_status()?;
        Ok(())
    }
}
