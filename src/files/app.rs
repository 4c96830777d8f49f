use crate::files::image_host::ImageHostClient;
use crate::shared::types::app::{ErrorResponse, bad_request, server_error};
use crate::shared::util::auth::Caller;
use crate::shared::util::config;

use actix_multipart::Multipart;
use actix_web::{post, web::Data, HttpResponse, Result};
use futures::StreamExt;
use serde::Serialize;

#[derive(Serialize, Debug)]
struct FileUploadReturn {
    success: bool,
    url: String,
    delete_handle: String
}

#[post("/v1/files")]
pub async fn create_file(image_host: Data<ImageHostClient>, caller: Caller, mut payload: Multipart) -> Result<HttpResponse> {
    let Caller(_caller) = caller;
    let max_bytes = config::get_config().storage.max_upload_bytes;

    if let Some(item) = payload.next().await {
        let mut field = match item {
            Ok(field) => field,
            Err(_err) => bad_request!("Malformed upload")
        };
        let filename = field.content_disposition().get_filename()
            .unwrap_or("upload").to_string();

        let mut data: Vec<u8> = Vec::new();
        while let Some(chunk) = field.next().await {
            match chunk {
                Ok(chunk) => {
                    if data.len() + chunk.len() > max_bytes {
                        bad_request!("File is too large");
                    }
                    data.extend_from_slice(&chunk);
                },
                Err(_err) => bad_request!("Malformed upload")
            };
        }

        // Validate if file is actually an image (from header)
        match imghdr::from_bytes(&data) {
            Some(imghdr::Type::Jpeg) | Some(imghdr::Type::Png) | Some(imghdr::Type::Webp) => (),
            _ => bad_request!("File is not a supported image")
        }

        return match image_host.upload(data, filename.as_str()).await {
            Ok(uploaded) => Ok(HttpResponse::Created().json(FileUploadReturn {
                success: true,
                url: uploaded.url,
                delete_handle: uploaded.delete_handle
            })),
            Err(err) => {
                log::error!("image upload failed: {:?}", err);
                server_error!("File upload failed")
            }
        };
    }
    bad_request!("No file in upload");
}
