use axum::{
    Router,
    routing::{get, post},
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::Engines;
use crate::error::{Error, ErrorKind};
use crate::observability::metrics::REGISTRY;
use crate::store::Store;
use crate::types::account::{AccountType, FinancialAccount};
use crate::types::ids::{AccountId, ActorId, LedgerId, NegotiationId, ServiceOrderId, VehicleId};
use crate::types::ledger::{Ledger, LedgerStatus, PaymentMethod, TransactionType};
use crate::types::money::Money;
use crate::types::negotiation::{ItemFlow, Negotiation, NegotiationStatus};
use crate::types::party::SellerRef;
use crate::types::service_order::{ServiceOrder, ServiceOrderStatus};
use crate::types::vehicle::{Vehicle, VehicleIntake, VehicleStatus};

pub struct ApiState {
    pub store: Arc<Store>,
    pub engines: Engines,
}

pub fn create_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/negotiations/:id", get(get_negotiation))
        .route("/negotiations/:id/approve", post(approve_negotiation))
        .route("/negotiations/:id/cancel", post(cancel_negotiation))
        .route("/ledgers/:id", get(get_ledger))
        .route("/ledgers/:id/settle", post(settle_ledger))
        .route("/service-orders/:id", get(get_service_order))
        .route("/service-orders/:id/complete", post(complete_service_order))
        .route("/vehicles/:id", get(get_vehicle))
        .route("/vehicles/acquisitions", post(register_acquisition))
        .route("/accounts/:id", get(get_account))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let families = REGISTRY.gather();
    let mut buffer = Vec::new();
    match encoder.encode(&families, &mut buffer) {
        Ok(()) => match String::from_utf8(buffer) {
            Ok(body) => (StatusCode::OK, body).into_response(),
            Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
        },
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// Engine errors cross the HTTP boundary with their kind, so clients
/// can branch without parsing prose.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorKind::InvalidState | ErrorKind::ReferentialConflict => StatusCode::CONFLICT,
            ErrorKind::EmptyCollection | ErrorKind::InsufficientFunds => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ErrorKind::Busy => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Config => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = serde_json::json!({
            "error": self.0.to_string(),
            "kind": self.0.kind().as_str(),
        });
        (status, Json(body)).into_response()
    }
}

fn parse_actor(raw: &str) -> Result<ActorId, ApiError> {
    ActorId::from_string(raw).map_err(|_| ApiError(Error::MalformedId(raw.to_string())))
}

#[derive(serde::Deserialize)]
struct ActorRequest {
    actor: String,
}

#[derive(serde::Serialize)]
struct NegotiationItemResponse {
    vehicle_id: String,
    flow: ItemFlow,
    agreed_value_cents: i64,
}

#[derive(serde::Serialize)]
struct NegotiationResponse {
    negotiation_id: String,
    customer_id: String,
    seller_id: String,
    status: NegotiationStatus,
    negotiation_date: Option<DateTime<Utc>>,
    total_value_cents: i64,
    items: Vec<NegotiationItemResponse>,
}

fn negotiation_response(negotiation: Negotiation) -> NegotiationResponse {
    NegotiationResponse {
        negotiation_id: negotiation.negotiation_id.to_string(),
        customer_id: negotiation.customer.to_string(),
        seller_id: negotiation.seller.to_string(),
        status: negotiation.status,
        negotiation_date: negotiation.negotiation_date,
        total_value_cents: negotiation.total_value.to_cents(),
        items: negotiation
            .items
            .into_iter()
            .map(|item| NegotiationItemResponse {
                vehicle_id: item.vehicle.to_string(),
                flow: item.flow,
                agreed_value_cents: item.agreed_value.to_cents(),
            })
            .collect(),
    }
}

async fn get_negotiation(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<NegotiationResponse>, ApiError> {
    let negotiation_id =
        NegotiationId::from_string(&id).map_err(|_| ApiError(Error::MalformedId(id)))?;
    let negotiation = state.store.get_negotiation(&negotiation_id)?;
    Ok(Json(negotiation_response(negotiation)))
}

async fn approve_negotiation(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    Json(req): Json<ActorRequest>,
) -> Result<Json<NegotiationResponse>, ApiError> {
    let negotiation_id =
        NegotiationId::from_string(&id).map_err(|_| ApiError(Error::MalformedId(id)))?;
    let actor = parse_actor(&req.actor)?;
    let negotiation = state.engines.approval.approve(negotiation_id, actor)?;
    Ok(Json(negotiation_response(negotiation)))
}

async fn cancel_negotiation(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    Json(req): Json<ActorRequest>,
) -> Result<Json<NegotiationResponse>, ApiError> {
    let negotiation_id =
        NegotiationId::from_string(&id).map_err(|_| ApiError(Error::MalformedId(id)))?;
    let actor = parse_actor(&req.actor)?;
    let negotiation = state.engines.cancellation.cancel(negotiation_id, actor)?;
    Ok(Json(negotiation_response(negotiation)))
}

#[derive(serde::Deserialize)]
struct SettleRequest {
    actor: String,
    amount_cents: i64,
    account_id: String,
    method: PaymentMethod,
}

#[derive(serde::Serialize)]
struct InstallmentResponse {
    number: u32,
    pay_date: NaiveDate,
    paid_value_cents: i64,
    account_id: String,
    method: PaymentMethod,
}

#[derive(serde::Serialize)]
struct LedgerResponse {
    ledger_id: String,
    entity_id: String,
    vehicle_id: Option<String>,
    negotiation_id: Option<String>,
    transaction_type: TransactionType,
    status: LedgerStatus,
    total_value_cents: i64,
    total_paid_cents: i64,
    due_date: NaiveDate,
    description: String,
    installments: Vec<InstallmentResponse>,
}

fn ledger_response(ledger: Ledger) -> LedgerResponse {
    LedgerResponse {
        ledger_id: ledger.ledger_id.to_string(),
        entity_id: ledger.entity.to_string(),
        vehicle_id: ledger.vehicle.map(|id| id.to_string()),
        negotiation_id: ledger.negotiation.map(|id| id.to_string()),
        transaction_type: ledger.transaction_type,
        status: ledger.status,
        total_value_cents: ledger.total_value.to_cents(),
        total_paid_cents: ledger.total_paid().to_cents(),
        due_date: ledger.due_date,
        description: ledger.description.clone(),
        installments: ledger
            .installments
            .iter()
            .map(|installment| InstallmentResponse {
                number: installment.number,
                pay_date: installment.pay_date,
                paid_value_cents: installment.paid_value.to_cents(),
                account_id: installment.account.to_string(),
                method: installment.method,
            })
            .collect(),
    }
}

async fn get_ledger(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<LedgerResponse>, ApiError> {
    let ledger_id = LedgerId::from_string(&id).map_err(|_| ApiError(Error::MalformedId(id)))?;
    let ledger = state.store.get_ledger(&ledger_id)?;
    Ok(Json(ledger_response(ledger)))
}

async fn settle_ledger(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    Json(req): Json<SettleRequest>,
) -> Result<Json<LedgerResponse>, ApiError> {
    let ledger_id = LedgerId::from_string(&id).map_err(|_| ApiError(Error::MalformedId(id)))?;
    let account_id =
        AccountId::from_string(&req.account_id).map_err(|_| ApiError(Error::MalformedId(req.account_id.clone())))?;
    let actor = parse_actor(&req.actor)?;
    let ledger = state.engines.settlement.settle(
        ledger_id,
        Money::from_cents(req.amount_cents),
        account_id,
        req.method,
        actor,
    )?;
    Ok(Json(ledger_response(ledger)))
}

#[derive(serde::Serialize)]
struct ServiceOrderResponse {
    service_order_id: String,
    vehicle_id: String,
    supplier_id: String,
    status: ServiceOrderStatus,
    issue_date: NaiveDate,
    completion_date: Option<NaiveDate>,
    total_cost_cents: i64,
    item_count: usize,
}

fn service_order_response(order: ServiceOrder) -> ServiceOrderResponse {
    ServiceOrderResponse {
        service_order_id: order.service_order_id.to_string(),
        vehicle_id: order.vehicle.to_string(),
        supplier_id: order.supplier.to_string(),
        status: order.status,
        issue_date: order.issue_date,
        completion_date: order.completion_date,
        total_cost_cents: order.total_cost.to_cents(),
        item_count: order.items.len(),
    }
}

async fn get_service_order(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<ServiceOrderResponse>, ApiError> {
    let service_order_id =
        ServiceOrderId::from_string(&id).map_err(|_| ApiError(Error::MalformedId(id)))?;
    let order = state.store.get_service_order(&service_order_id)?;
    Ok(Json(service_order_response(order)))
}

async fn complete_service_order(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    Json(req): Json<ActorRequest>,
) -> Result<Json<ServiceOrderResponse>, ApiError> {
    let service_order_id =
        ServiceOrderId::from_string(&id).map_err(|_| ApiError(Error::MalformedId(id)))?;
    let actor = parse_actor(&req.actor)?;
    let order = state.engines.completion.complete(service_order_id, actor)?;
    Ok(Json(service_order_response(order)))
}

#[derive(serde::Deserialize)]
struct AcquisitionRequest {
    actor: String,
    chassis: String,
    plate: Option<String>,
    description: String,
    model_year: u16,
    acquisition_cost_cents: i64,
    sale_price_cents: i64,
    seller_name: String,
    seller_document: String,
}

#[derive(serde::Serialize)]
struct VehicleResponse {
    vehicle_id: String,
    chassis: String,
    plate: Option<String>,
    description: String,
    model_year: u16,
    status: VehicleStatus,
    owner_id: String,
    acquisition_cost_cents: i64,
    sale_price_cents: i64,
}

fn vehicle_response(vehicle: Vehicle) -> VehicleResponse {
    VehicleResponse {
        vehicle_id: vehicle.vehicle_id.to_string(),
        chassis: vehicle.chassis,
        plate: vehicle.plate,
        description: vehicle.description,
        model_year: vehicle.model_year,
        status: vehicle.status,
        owner_id: vehicle.current_owner.to_string(),
        acquisition_cost_cents: vehicle.acquisition_cost.to_cents(),
        sale_price_cents: vehicle.sale_price.to_cents(),
    }
}

async fn get_vehicle(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<VehicleResponse>, ApiError> {
    let vehicle_id = VehicleId::from_string(&id).map_err(|_| ApiError(Error::MalformedId(id)))?;
    let vehicle = state.store.get_vehicle(&vehicle_id)?;
    Ok(Json(vehicle_response(vehicle)))
}

async fn register_acquisition(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<AcquisitionRequest>,
) -> Result<(StatusCode, Json<VehicleResponse>), ApiError> {
    let actor = parse_actor(&req.actor)?;
    let intake = VehicleIntake {
        chassis: req.chassis,
        plate: req.plate,
        description: req.description,
        model_year: req.model_year,
        acquisition_cost: Money::from_cents(req.acquisition_cost_cents),
        sale_price: Money::from_cents(req.sale_price_cents),
    };
    let seller = SellerRef {
        name: req.seller_name,
        document: req.seller_document,
    };
    let vehicle = state.engines.acquisition.register(intake, seller, actor)?;
    Ok((StatusCode::CREATED, Json(vehicle_response(vehicle))))
}

#[derive(serde::Serialize)]
struct AccountResponse {
    account_id: String,
    name: String,
    account_type: AccountType,
    balance_cents: i64,
}

fn account_response(account: FinancialAccount) -> AccountResponse {
    AccountResponse {
        account_id: account.account_id.to_string(),
        name: account.name,
        account_type: account.account_type,
        balance_cents: account.balance.to_cents(),
    }
}

async fn get_account(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<AccountResponse>, ApiError> {
    let account_id = AccountId::from_string(&id).map_err(|_| ApiError(Error::MalformedId(id)))?;
    let account = state.store.get_account(&account_id)?;
    Ok(Json(account_response(account)))
}
