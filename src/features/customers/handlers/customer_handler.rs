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
use crate::features::customers::dtos::{
    CreateCustomerDto, CustomerDetailDto, CustomerListQuery, CustomerResponseDto,
    CustomerSearchQuery, CustomerStatsDto, UpdateCustomerDto,
};
use crate::features::customers::models::CustomerFilter;
use crate::features::customers::services::CustomerService;
use crate::shared::constants::DEFAULT_SEARCH_LIMIT;
use crate::shared::types::{ApiResponse, Meta};

/// List customers
#[utoipa::path(
    get,
    path = "/api/customers",
    params(CustomerListQuery),
    responses(
        (status = 200, description = "Paginated customers", body = ApiResponse<Vec<CustomerResponseDto>>),
    ),
    security(("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn list_customers(
    State(service): State<Arc<CustomerService>>,
    Query(query): Query<CustomerListQuery>,
) -> Result<Json<ApiResponse<Vec<CustomerResponseDto>>>> {
    let filter = CustomerFilter::from(query);
    let page = service.list(&filter).await?;
    let meta = Meta::for_page(page.total, &filter.pagination);
    Ok(Json(ApiResponse::success(Some(page.items), None, Some(meta))))
}

/// Create a customer
#[utoipa::path(
    post,
    path = "/api/customers",
    request_body = CreateCustomerDto,
    responses(
        (status = 201, description = "Customer created", body = ApiResponse<CustomerResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already used by another customer")
    ),
    security(("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn create_customer(
    actor: Actor,
    State(service): State<Arc<CustomerService>>,
    AppJson(dto): AppJson<CreateCustomerDto>,
) -> Result<(StatusCode, Json<ApiResponse<CustomerResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let customer = service.create(dto, &actor).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(customer),
            Some("Customer created successfully".to_string()),
            None,
        )),
    ))
}

/// Quick search by name, email or company
#[utoipa::path(
    get,
    path = "/api/customers/search",
    params(CustomerSearchQuery),
    responses(
        (status = 200, description = "Matching customers ordered by name", body = ApiResponse<Vec<CustomerResponseDto>>),
    ),
    security(("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn search_customers(
    State(service): State<Arc<CustomerService>>,
    Query(query): Query<CustomerSearchQuery>,
) -> Result<Json<ApiResponse<Vec<CustomerResponseDto>>>> {
    let limit = query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    let customers = service.search(&query.q, limit).await?;
    Ok(Json(ApiResponse::success(Some(customers), None, None)))
}

/// Customer counts
#[utoipa::path(
    get,
    path = "/api/customers/stats",
    responses(
        (status = 200, description = "Customer statistics", body = ApiResponse<CustomerStatsDto>),
    ),
    security(("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn get_customer_stats(
    State(service): State<Arc<CustomerService>>,
) -> Result<Json<ApiResponse<CustomerStatsDto>>> {
    let stats = service.stats().await?;
    Ok(Json(ApiResponse::success(Some(stats), None, None)))
}

/// Get a customer with its tickets and notes
#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    params(
        ("id" = Uuid, Path, description = "Customer ID")
    ),
    responses(
        (status = 200, description = "Customer found", body = ApiResponse<CustomerDetailDto>),
        (status = 404, description = "Customer not found")
    ),
    security(("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn get_customer(
    State(service): State<Arc<CustomerService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CustomerDetailDto>>> {
    let customer = service.get(id).await?;
    Ok(Json(ApiResponse::success(Some(customer), None, None)))
}

/// Update a customer
#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    params(
        ("id" = Uuid, Path, description = "Customer ID")
    ),
    request_body = UpdateCustomerDto,
    responses(
        (status = 200, description = "Customer updated", body = ApiResponse<CustomerResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Customer not found"),
        (status = 409, description = "Email already used by another customer")
    ),
    security(("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn update_customer(
    actor: Actor,
    State(service): State<Arc<CustomerService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateCustomerDto>,
) -> Result<Json<ApiResponse<CustomerResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let customer = service.update(id, dto, &actor).await?;
    Ok(Json(ApiResponse::success(
        Some(customer),
        Some("Customer updated successfully".to_string()),
        None,
    )))
}

/// Delete a customer without tickets
#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    params(
        ("id" = Uuid, Path, description = "Customer ID")
    ),
    responses(
        (status = 200, description = "Customer deleted"),
        (status = 404, description = "Customer not found"),
        (status = 409, description = "Customer still has tickets")
    ),
    security(("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn delete_customer(
    actor: Actor,
    State(service): State<Arc<CustomerService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(id, &actor).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Customer deleted successfully".to_string()),
        None,
    )))
}
