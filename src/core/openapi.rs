use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::activities::{dtos as activities_dtos, handlers as activities_handlers};
use crate::features::activities::models as activities_models;
use crate::features::backups::{dtos as backups_dtos, handlers as backups_handlers};
use crate::features::customers::{dtos as customers_dtos, handlers as customers_handlers};
use crate::features::exports::{dtos as exports_dtos, handlers as exports_handlers};
use crate::features::imports::{dtos as imports_dtos, handlers as imports_handlers};
use crate::features::notes::dtos as notes_dtos;
use crate::features::tickets::{
    dtos as tickets_dtos, handlers as tickets_handlers, models as tickets_models,
};
use crate::features::users::dtos as users_dtos;
use crate::shared::types::{ApiResponse, DateRange, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Customers
        customers_handlers::list_customers,
        customers_handlers::create_customer,
        customers_handlers::search_customers,
        customers_handlers::get_customer_stats,
        customers_handlers::get_customer,
        customers_handlers::update_customer,
        customers_handlers::delete_customer,
        // Imports
        imports_handlers::import_customers,
        imports_handlers::download_sample_csv,
        // Tickets
        tickets_handlers::list_tickets,
        tickets_handlers::create_ticket,
        tickets_handlers::get_ticket_stats,
        tickets_handlers::get_stage_counts,
        tickets_handlers::get_overdue_tickets,
        tickets_handlers::get_ticket,
        tickets_handlers::update_ticket,
        tickets_handlers::move_ticket_stage,
        tickets_handlers::assign_ticket,
        tickets_handlers::add_ticket_note,
        // Activities
        activities_handlers::list_activities,
        activities_handlers::list_my_activities,
        // Exports
        exports_handlers::export_customers,
        exports_handlers::export_tickets,
        exports_handlers::export_users,
        exports_handlers::export_all,
        exports_handlers::get_export_stats,
        // Backups & account
        backups_handlers::create_backup,
        backups_handlers::list_backups,
        backups_handlers::get_backup_stats,
        backups_handlers::delete_account,
    ),
    components(
        schemas(
            // Shared
            Meta,
            DateRange,
            users_dtos::UserSummaryDto,
            users_dtos::UserExportDto,
            notes_dtos::NoteResponseDto,
            // Customers
            customers_dtos::CreateCustomerDto,
            customers_dtos::UpdateCustomerDto,
            customers_dtos::CustomerResponseDto,
            customers_dtos::CustomerDetailDto,
            customers_dtos::CustomerStatsDto,
            ApiResponse<customers_dtos::CustomerResponseDto>,
            ApiResponse<Vec<customers_dtos::CustomerResponseDto>>,
            ApiResponse<customers_dtos::CustomerDetailDto>,
            // Imports
            imports_dtos::ImportUploadDto,
            imports_dtos::ImportedCustomerDto,
            imports_dtos::ImportResultDto,
            ApiResponse<imports_dtos::ImportResultDto>,
            // Tickets
            tickets_models::TicketStage,
            tickets_models::TicketPriority,
            tickets_dtos::CreateTicketDto,
            tickets_dtos::UpdateTicketDto,
            tickets_dtos::MoveStageDto,
            tickets_dtos::AssignTicketDto,
            tickets_dtos::AddNoteDto,
            tickets_dtos::TicketCustomerDto,
            tickets_dtos::TicketResponseDto,
            tickets_dtos::TicketDetailDto,
            tickets_dtos::TicketSummaryDto,
            tickets_dtos::StageCountsDto,
            tickets_dtos::PriorityCountsDto,
            tickets_dtos::TicketStatsDto,
            ApiResponse<tickets_dtos::TicketResponseDto>,
            ApiResponse<Vec<tickets_dtos::TicketResponseDto>>,
            ApiResponse<tickets_dtos::TicketDetailDto>,
            // Activities
            activities_models::ActivityType,
            activities_dtos::ActivityResponseDto,
            ApiResponse<Vec<activities_dtos::ActivityResponseDto>>,
            // Exports
            exports_dtos::ExportFormat,
            exports_dtos::CustomerExportDto,
            exports_dtos::TicketExportDto,
            exports_dtos::ExportedDataDto,
            exports_dtos::FullExportDto,
            exports_dtos::ExportStatsDto,
            // Backups
            backups_dtos::BackupKind,
            backups_dtos::BackupMetadata,
            backups_dtos::BackupStatsDto,
            backups_dtos::DeleteAccountDto,
            backups_dtos::AccountDeletionResultDto,
            ApiResponse<Vec<backups_dtos::BackupMetadata>>,
        )
    ),
    tags(
        (name = "customers", description = "Customer records"),
        (name = "imports", description = "Bulk customer import from CSV"),
        (name = "tickets", description = "Support tickets and their workflow"),
        (name = "activities", description = "Audit log of user actions"),
        (name = "exports", description = "CSV and JSON data exports"),
        (name = "backups", description = "Backups and account deletion"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Grip CRM API",
        version = "0.1.0",
        description = "API documentation for Grip CRM",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_core_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/customers",
            "/api/customers/import",
            "/api/tickets/{id}/stage",
            "/api/tickets/{id}/assign",
            "/api/export/all",
            "/api/account",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
