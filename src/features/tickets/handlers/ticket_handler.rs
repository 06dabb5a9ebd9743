use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::activities::models::Actor;
use crate::features::notes::dtos::NoteResponseDto;
use crate::features::tickets::dtos::{
    AddNoteDto, AssignTicketDto, CreateTicketDto, MoveStageDto, StageCountsDto, TicketDetailDto,
    TicketFilterQuery, TicketResponseDto, TicketStatsDto, UpdateTicketDto,
};
use crate::features::tickets::models::TicketFilter;
use crate::features::tickets::services::TicketService;
use crate::shared::types::{ApiResponse, Meta};

/// List tickets
#[utoipa::path(
    get,
    path = "/api/tickets",
    params(TicketFilterQuery),
    responses(
        (status = 200, description = "Paginated tickets, newest first", body = ApiResponse<Vec<TicketResponseDto>>),
    ),
    security(("bearer_auth" = [])),
    tag = "tickets"
)]
pub async fn list_tickets(
    State(service): State<Arc<TicketService>>,
    Query(query): Query<TicketFilterQuery>,
) -> Result<Json<ApiResponse<Vec<TicketResponseDto>>>> {
    let filter = TicketFilter::from(query);
    let page = service.list(&filter).await?;
    let meta = Meta::for_page(page.total, &filter.pagination);
    Ok(Json(ApiResponse::success(Some(page.items), None, Some(meta))))
}

/// Create a ticket
#[utoipa::path(
    post,
    path = "/api/tickets",
    request_body = CreateTicketDto,
    responses(
        (status = 201, description = "Ticket created in the `new` stage", body = ApiResponse<TicketResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Customer or assignee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "tickets"
)]
pub async fn create_ticket(
    actor: Actor,
    State(service): State<Arc<TicketService>>,
    AppJson(dto): AppJson<CreateTicketDto>,
) -> Result<(StatusCode, Json<ApiResponse<TicketResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let ticket = service.create(dto, &actor).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(ticket),
            Some("Ticket created successfully".to_string()),
            None,
        )),
    ))
}

/// Ticket totals by stage, priority, overdue and completed this month
#[utoipa::path(
    get,
    path = "/api/tickets/stats",
    responses(
        (status = 200, description = "Ticket statistics", body = ApiResponse<TicketStatsDto>),
    ),
    security(("bearer_auth" = [])),
    tag = "tickets"
)]
pub async fn get_ticket_stats(
    State(service): State<Arc<TicketService>>,
) -> Result<Json<ApiResponse<TicketStatsDto>>> {
    let stats = service.stats().await?;
    Ok(Json(ApiResponse::success(Some(stats), None, None)))
}

/// Ticket count per stage
#[utoipa::path(
    get,
    path = "/api/tickets/by-stage",
    responses(
        (status = 200, description = "Count for each stage", body = ApiResponse<StageCountsDto>),
    ),
    security(("bearer_auth" = [])),
    tag = "tickets"
)]
pub async fn get_stage_counts(
    State(service): State<Arc<TicketService>>,
) -> Result<Json<ApiResponse<StageCountsDto>>> {
    let counts = service.stage_counts().await?;
    Ok(Json(ApiResponse::success(Some(counts), None, None)))
}

/// Open tickets past their due date
#[utoipa::path(
    get,
    path = "/api/tickets/overdue",
    responses(
        (status = 200, description = "Overdue tickets, earliest due first", body = ApiResponse<Vec<TicketResponseDto>>),
    ),
    security(("bearer_auth" = [])),
    tag = "tickets"
)]
pub async fn get_overdue_tickets(
    State(service): State<Arc<TicketService>>,
) -> Result<Json<ApiResponse<Vec<TicketResponseDto>>>> {
    let tickets = service.overdue().await?;
    Ok(Json(ApiResponse::success(Some(tickets), None, None)))
}

/// Get ticket by ID
#[utoipa::path(
    get,
    path = "/api/tickets/{id}",
    params(
        ("id" = Uuid, Path, description = "Ticket ID")
    ),
    responses(
        (status = 200, description = "Ticket found", body = ApiResponse<TicketDetailDto>),
        (status = 404, description = "Ticket not found")
    ),
    security(("bearer_auth" = [])),
    tag = "tickets"
)]
pub async fn get_ticket(
    State(service): State<Arc<TicketService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TicketDetailDto>>> {
    let ticket = service.get(id).await?;
    Ok(Json(ApiResponse::success(Some(ticket), None, None)))
}

/// Update ticket fields other than the stage
#[utoipa::path(
    put,
    path = "/api/tickets/{id}",
    params(
        ("id" = Uuid, Path, description = "Ticket ID")
    ),
    request_body = UpdateTicketDto,
    responses(
        (status = 200, description = "Ticket updated", body = ApiResponse<TicketResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Ticket, customer or assignee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "tickets"
)]
pub async fn update_ticket(
    actor: Actor,
    State(service): State<Arc<TicketService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateTicketDto>,
) -> Result<Json<ApiResponse<TicketResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let ticket = service.update(id, dto, &actor).await?;
    Ok(Json(ApiResponse::success(
        Some(ticket),
        Some("Ticket updated successfully".to_string()),
        None,
    )))
}

/// Move a ticket to another stage
#[utoipa::path(
    patch,
    path = "/api/tickets/{id}/stage",
    params(
        ("id" = Uuid, Path, description = "Ticket ID")
    ),
    request_body = MoveStageDto,
    responses(
        (status = 200, description = "Stage changed", body = ApiResponse<TicketResponseDto>),
        (status = 404, description = "Ticket not found")
    ),
    security(("bearer_auth" = [])),
    tag = "tickets"
)]
pub async fn move_ticket_stage(
    actor: Actor,
    State(service): State<Arc<TicketService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<MoveStageDto>,
) -> Result<Json<ApiResponse<TicketResponseDto>>> {
    let ticket = service.move_stage(id, dto.stage, &actor).await?;
    Ok(Json(ApiResponse::success(Some(ticket), None, None)))
}

/// Assign a ticket to a user
#[utoipa::path(
    patch,
    path = "/api/tickets/{id}/assign",
    params(
        ("id" = Uuid, Path, description = "Ticket ID")
    ),
    request_body = AssignTicketDto,
    responses(
        (status = 200, description = "Ticket assigned", body = ApiResponse<TicketResponseDto>),
        (status = 404, description = "Ticket or user not found")
    ),
    security(("bearer_auth" = [])),
    tag = "tickets"
)]
pub async fn assign_ticket(
    actor: Actor,
    State(service): State<Arc<TicketService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<AssignTicketDto>,
) -> Result<Json<ApiResponse<TicketResponseDto>>> {
    let ticket = service.assign(id, dto.assigned_user_id, &actor).await?;
    Ok(Json(ApiResponse::success(Some(ticket), None, None)))
}

/// Add a note to a ticket
#[utoipa::path(
    post,
    path = "/api/tickets/{id}/notes",
    params(
        ("id" = Uuid, Path, description = "Ticket ID")
    ),
    request_body = AddNoteDto,
    responses(
        (status = 201, description = "Note added", body = ApiResponse<NoteResponseDto>),
        (status = 400, description = "Empty note"),
        (status = 404, description = "Ticket not found")
    ),
    security(("bearer_auth" = [])),
    tag = "tickets"
)]
pub async fn add_ticket_note(
    actor: Actor,
    State(service): State<Arc<TicketService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<AddNoteDto>,
) -> Result<(StatusCode, Json<ApiResponse<NoteResponseDto>>)> {
    let note = service.add_note(id, &dto.content, &actor).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(note), None, None)),
    ))
}
