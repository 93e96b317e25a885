//! OpenAPI documentation

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::reception_email::receive_email_document,
        crate::handlers::reception_upload::upload_documents,
        crate::handlers::documents::list_documents,
        crate::handlers::documents::get_document,
        crate::handlers::extractions::get_extraction,
        crate::handlers::vouchers::create_voucher_from_extraction,
        crate::handlers::vouchers::get_voucher,
    ),
    components(schemas(
        crate::handlers::reception_email::EmailDocumentRequest,
        crate::handlers::extractions::ExtractionDetailResponse,
        crate::error::ErrorResponse,
        kontera_core::models::ReceptionAck,
        kontera_core::models::DocumentResponse,
        kontera_core::models::ExtractionStatus,
        kontera_core::models::InvoiceData,
        kontera_core::models::DebitPrediction,
        kontera_core::models::InvoiceDetails,
        kontera_core::models::VoucherResponse,
        kontera_core::models::PostingResponse,
    )),
    tags(
        (name = "reception", description = "Invoice document ingestion"),
        (name = "extractions", description = "AI extraction results"),
        (name = "vouchers", description = "Vouchers created from extractions")
    )
)]
pub struct ApiDoc;
