//! Service and state wiring
//!
//! Repositories, ledger services, the completion client, the extraction
//! task handler, and the bounded queue are built here. The queue holds a
//! weak reference to the handler; the strong Arc lives in the state.

use std::sync::{Arc, Weak};

use kontera_core::Config;
use kontera_db::{
    AccountRepository, DocumentRepository, ExtractionRepository, TenantRepository,
    VatCodeRepository, VoucherRepository,
};
use kontera_extraction::{CompletionClient, InvoiceExtractor, OpenAiClient};
use kontera_ledger::{VoucherConversionService, VoucherService};
use kontera_worker::{ExtractionJobHandler, ExtractionQueue, ExtractionQueueConfig};
use sqlx::PgPool;

use crate::services::reception::ReceptionService;
use crate::state::{AppState, DbState, LedgerState, TaskState};
use crate::task_handlers::ExtractionTaskHandler;

pub fn build_state(config: Config, pool: PgPool) -> Arc<AppState> {
    let tenant_repository = TenantRepository::new(pool.clone());
    let document_repository = DocumentRepository::new(pool.clone());
    let extraction_repository = ExtractionRepository::new(pool.clone());
    let vat_code_repository = VatCodeRepository::new(pool.clone());
    let account_repository = AccountRepository::new(pool.clone());
    let voucher_repository = VoucherRepository::new(pool.clone());

    let voucher_service = VoucherService::new(voucher_repository);
    let conversion_service = VoucherConversionService::new(
        extraction_repository.clone(),
        document_repository.clone(),
        voucher_service.clone(),
    );

    if config.openai_api_key().is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; extractions will fail until it is configured");
    }
    let completion_client: Arc<dyn CompletionClient> = Arc::new(OpenAiClient::new(
        config.openai_api_key().map(str::to_string),
        config.openai_model().to_string(),
        config.openai_base_url().to_string(),
    ));
    let extractor = InvoiceExtractor::new(completion_client);

    let extraction_handler = Arc::new(ExtractionTaskHandler::new(
        document_repository.clone(),
        extraction_repository.clone(),
        vat_code_repository,
        account_repository,
        extractor,
        conversion_service.clone(),
    ));
    let handler_weak: Weak<dyn ExtractionJobHandler> = {
        let handler: Arc<dyn ExtractionJobHandler> = extraction_handler.clone();
        Arc::downgrade(&handler)
    };

    let extraction_queue = ExtractionQueue::new(
        ExtractionQueueConfig {
            max_workers: config.extraction_max_workers(),
            queue_depth: config.extraction_queue_depth(),
            job_timeout_secs: config.extraction_timeout_seconds(),
        },
        handler_weak,
    );

    let reception = ReceptionService::new(
        document_repository.clone(),
        extraction_repository.clone(),
        extraction_queue.clone(),
    );

    let is_production = config.is_production();

    Arc::new(AppState {
        db: DbState {
            pool,
            tenant_repository,
            document_repository,
            extraction_repository,
        },
        ledger: LedgerState {
            voucher_service,
            conversion_service,
        },
        tasks: TaskState {
            extraction_queue,
            extraction_handler,
        },
        reception,
        config,
        is_production,
    })
}
