use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures::StreamExt;
use uuid::Uuid;

use super::params::{positive, Params};
use crate::aiforged::{
    ClientError, Context, DocumentFilter, DocumentStatus, UploadParams, UploadedFile, UsageType,
    UserViewModel,
};
use crate::models::{summarize_fields, DocumentRequest};
use crate::utils::datetime::parse_lenient;
use crate::utils::{ApiError, GENERIC_ERROR_MESSAGE};

pub const ROUTE_PREFIX: &str = "/AIForged";
pub const VERIFICATION_IN_PROGRESS: &str = "Document verification in progress.";

/// Same ceiling as the default Kestrel request body limit.
const MAX_UPLOAD_BYTES: usize = 30_000_000;

/// Behaviour switches for the controller, fixed at startup.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControllerOptions {
    /// When set, a delete the platform did not answer with 200 is reported as a failure.
    pub strict_delete: bool,
}

fn message(text: impl Into<String>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": text.into()
    }))
}

/// Webhook callers get the bare text.
fn plain_text(text: impl Into<String>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(text.into())
}

fn remote_fault(err: ClientError) -> ApiError {
    log::error!("❌ {}", err);
    err.into()
}

async fn current_user(ctx: &Context) -> Result<UserViewModel, ApiError> {
    let response = ctx.account.get_current_user().await.map_err(remote_fault)?;
    response
        .result
        .ok_or_else(|| remote_fault(ClientError::EmptyResult("Account/GetCurrentUser")))
}

fn parse_date(params: &Params, key: &str) -> Result<Option<chrono::DateTime<chrono::Utc>>, ApiError> {
    match params.text(key) {
        Some(raw) => parse_lenient(&raw)
            .map(Some)
            .ok_or_else(|| ApiError::validation(format!("The value '{}' is not valid for {}.", raw, key))),
        None => Ok(None),
    }
}

/// GET /AIForged/GetCurrentUser
pub async fn get_current_user(ctx: web::Data<Context>) -> Result<HttpResponse, ApiError> {
    log::info!("👤 GET /AIForged/GetCurrentUser");

    let response = ctx.account.get_current_user().await.map_err(remote_fault)?;
    Ok(HttpResponse::Ok().json(response.result))
}

/// POST /AIForged/Incoming - webhook raised by the platform
pub async fn incoming(
    ctx: web::Data<Context>,
    body: web::Json<DocumentRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner();
    log::info!("📨 POST /AIForged/Incoming - docId: {}, status: {}", request.doc_id, request.status);

    if request.doc_id <= 0 {
        return Err(ApiError::validation("Invalid document request."));
    }

    // Extraction would race the verification still running upstream.
    if request.is_in_verification() {
        return Ok(plain_text(VERIFICATION_IN_PROGRESS));
    }

    let response = ctx.parameters.extract(request.doc_id).await.map_err(remote_fault)?;
    let fields = response
        .result
        .ok_or_else(|| remote_fault(ClientError::EmptyResult("Parameters/Extract")))?;

    log::info!("✅ Extracted {} fields from document {}", fields.len(), request.doc_id);
    Ok(plain_text(summarize_fields(&fields)))
}

/// GET /AIForged/GetDocuments?startDate&endDate&projectId&serviceId&usage&status
pub async fn get_documents(
    ctx: web::Data<Context>,
    params: Params,
) -> Result<HttpResponse, ApiError> {
    let project_id = params.parse::<i32>("projectId")?;
    let service_id = params.parse::<i32>("serviceId")?;
    log::info!("📄 GET /AIForged/GetDocuments - projectId: {:?}, serviceId: {:?}", project_id, service_id);

    let (Some(project_id), Some(stpd_id)) = (positive(project_id), positive(service_id)) else {
        return Err(ApiError::validation("Invalid projectId or serviceId."));
    };

    let start = parse_date(&params, "startDate")?;
    let end = parse_date(&params, "endDate")?;
    let usage = params.parse::<UsageType>("usage")?;
    let statuses = params.list::<DocumentStatus>("status")?;

    let user = current_user(&ctx).await?;

    let filter = DocumentFilter {
        user_id: user.id,
        project_id,
        stpd_id,
        usage,
        statuses,
        start,
        end,
        ..Default::default()
    };

    let response = ctx.documents.get_extended(&filter).await.map_err(remote_fault)?;
    match response.result {
        Some(documents) => {
            log::info!("✅ {} documents returned for project {}", documents.len(), project_id);
            Ok(HttpResponse::Ok().json(documents))
        }
        None => {
            log::error!("❌ Document/GetExtended returned no result for project {}", project_id);
            Err(ApiError::RemoteFailure(format!("{} No documents returned.", GENERIC_ERROR_MESSAGE)))
        }
    }
}

/// Buffers every file part and folds text parts into `params`.
async fn read_multipart(
    mut payload: Multipart,
    params: &mut Params,
) -> Result<Vec<UploadedFile>, ApiError> {
    let malformed = |e: actix_multipart::MultipartError| {
        ApiError::validation(format!("Malformed multipart body: {}", e))
    };

    let mut files = Vec::new();
    let mut total = 0usize;

    while let Some(field) = payload.next().await {
        let mut field = field.map_err(malformed)?;
        let name = field.name().unwrap_or_default().to_string();
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .filter(|f| !f.is_empty())
            .map(str::to_string);

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(malformed)?;
            total += chunk.len();
            if total > MAX_UPLOAD_BYTES {
                return Err(ApiError::validation(format!(
                    "Upload exceeds the {} byte limit.",
                    MAX_UPLOAD_BYTES
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        match filename {
            Some(filename) => files.push(UploadedFile { filename, bytes }),
            None => params.push(name, String::from_utf8_lossy(&bytes).into_owned()),
        }
    }

    Ok(files)
}

/// POST /AIForged/Upload - multipart files plus upload metadata
pub async fn upload(
    ctx: web::Data<Context>,
    params: Params,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let mut params = params;
    let files = read_multipart(payload, &mut params).await?;
    log::info!("📤 POST /AIForged/Upload - {} files", files.len());

    if files.is_empty() {
        return Err(ApiError::validation("No files provided for upload."));
    }

    let (Some(stpd_id), Some(project_id)) = (
        positive(params.parse::<i32>("stpdId")?),
        positive(params.parse::<i32>("projectId")?),
    ) else {
        return Err(ApiError::validation("Invalid stpdId or projectId."));
    };

    let upload_params = UploadParams {
        stpd_id,
        project_id,
        class_id: params.parse::<i32>("classId")?,
        status: params.parse::<DocumentStatus>("status")?.unwrap_or_default(),
        usage: params.parse::<UsageType>("usage")?.unwrap_or_default(),
        master_id: params.parse::<i32>("masterId")?,
        comment: params.text("comment"),
        external_id: params.text("externalId"),
        result: params.text("result"),
        result_id: params.text("resultId"),
        result_index: params.parse::<i32>("resultIndex")?,
        guid: params.parse::<Uuid>("guid")?,
    };

    let user = current_user(&ctx).await?;

    let total = files.len();
    let mut documents = Vec::new();

    // Sequential on purpose: the first failure stops the remaining files. Files
    // already sent stay on the platform.
    for (uploaded, file) in files.into_iter().enumerate() {
        let filename = file.filename.clone();
        let rejected = || {
            log::warn!("⚠️  Upload of {} rejected after {} of {} files", filename, uploaded, total);
            ApiError::Rejected(format!(
                "Error uploading file {} ({} of {} files uploaded)",
                filename, uploaded, total
            ))
        };

        match ctx.documents.upload_file(&user.id, &upload_params, file).await {
            Ok(response) if response.status_code == 200 => {
                documents.extend(response.result.unwrap_or_default());
            }
            Ok(_) | Err(ClientError::Status { .. }) => return Err(rejected()),
            Err(e) => return Err(remote_fault(e)),
        }
    }

    log::info!("✅ Uploaded {} files to project {}", total, project_id);
    Ok(HttpResponse::Ok().json(documents))
}

/// POST /AIForged/Process?stpdId&projectId&docIds
pub async fn process(
    ctx: web::Data<Context>,
    params: Params,
) -> Result<HttpResponse, ApiError> {
    let stpd_id = positive(params.parse::<i32>("stpdId")?);
    let project_id = positive(params.parse::<i32>("projectId")?);
    let doc_ids = params.list::<i32>("docIds")?;
    log::info!("⚙️  POST /AIForged/Process - {} documents", doc_ids.len());

    let (Some(stpd_id), Some(project_id)) = (stpd_id, project_id) else {
        return Err(ApiError::validation("Invalid input parameters."));
    };
    if doc_ids.is_empty() {
        return Err(ApiError::validation("Invalid input parameters."));
    }

    let user_id = match ctx.current_user_id() {
        Some(id) => id.to_string(),
        None => current_user(&ctx).await?.id,
    };

    ctx.services
        .process(&user_id, project_id, stpd_id, &doc_ids)
        .await
        .map_err(remote_fault)?;

    Ok(message("Documents processed successfully."))
}

/// PUT /AIForged/SetDocStatus?docId&status
pub async fn set_doc_status(
    ctx: web::Data<Context>,
    params: Params,
) -> Result<HttpResponse, ApiError> {
    let doc_id = params.parse::<i32>("docId")?;
    log::info!("📝 PUT /AIForged/SetDocStatus - docId: {:?}", doc_id);

    let Some(doc_id) = positive(doc_id) else {
        return Err(ApiError::validation("Invalid document ID."));
    };
    let Some(status) = params.parse::<DocumentStatus>("status")? else {
        return Err(ApiError::validation("A status value is required."));
    };

    let not_found = || ApiError::NotFound(format!("Document with ID {} not found.", doc_id));
    let mut document = match ctx.documents.get_document(doc_id).await {
        Ok(response) => response.result.ok_or_else(not_found)?,
        Err(e) if e.status() == Some(404) => return Err(not_found()),
        Err(e) => return Err(remote_fault(e)),
    };

    document.status = status.clone();

    let update_failed = |code: u16| {
        log::error!("❌ Status update of document {} failed with {}", doc_id, code);
        ApiError::RemoteFailure(format!("Failed to update document status. Status code: {}", code))
    };
    match ctx.documents.update(&document).await {
        Ok(response) if response.status_code == 200 => {}
        Ok(response) => return Err(update_failed(response.status_code)),
        Err(ClientError::Status { status, .. }) => return Err(update_failed(status)),
        Err(e) => return Err(remote_fault(e)),
    }

    Ok(message(format!("Document {} status updated to {} successfully.", doc_id, status)))
}

/// DELETE /AIForged/DeleteDoc?docId&deleteRecursive
///
/// Unless `strict_delete` is set, success is reported as soon as the platform call
/// returns without a transport or status error; the response itself is not checked.
pub async fn delete_doc(
    ctx: web::Data<Context>,
    options: web::Data<ControllerOptions>,
    params: Params,
) -> Result<HttpResponse, ApiError> {
    let doc_id = params.parse::<i32>("docId")?;
    let delete_recursive = params.flag("deleteRecursive")?.unwrap_or(false);
    log::info!("🗑️  DELETE /AIForged/DeleteDoc - docId: {:?}, recursive: {}", doc_id, delete_recursive);

    let Some(doc_id) = positive(doc_id) else {
        return Err(ApiError::validation("Invalid document ID."));
    };

    let delete_failed = |code: u16| {
        ApiError::RemoteFailure(format!("Failed to delete document {}. Status code: {}", doc_id, code))
    };
    match ctx.documents.delete(doc_id, delete_recursive, false).await {
        Ok(response) if options.strict_delete && response.status_code != 200 => {
            return Err(delete_failed(response.status_code))
        }
        Ok(_) => {}
        Err(ClientError::Status { status, .. }) if options.strict_delete => {
            return Err(delete_failed(status))
        }
        Err(e) => return Err(remote_fault(e)),
    }

    Ok(message(format!("Document {} deleted successfully.", doc_id)))
}

/// GET /AIForged/Extract?docId
pub async fn extract(
    ctx: web::Data<Context>,
    params: Params,
) -> Result<HttpResponse, ApiError> {
    let doc_id = params.parse::<i32>("docId")?;
    log::info!("🔎 GET /AIForged/Extract - docId: {:?}", doc_id);

    let Some(doc_id) = positive(doc_id) else {
        return Err(ApiError::validation("Invalid document ID."));
    };

    let response = ctx.parameters.extract(doc_id).await.map_err(remote_fault)?;
    Ok(HttpResponse::Ok().json(response.result))
}
