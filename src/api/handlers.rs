//! REST API handlers for accounts, transactions and proposals

use crate::chain::{PresignedSigner, SignDoc};
use crate::core::CoordinatorError;
use crate::multisig::{Member, MultisigAccount};
use crate::proposal::{Proposal, ProposalAction, VoteChoice};
use crate::service::{CleanupReport, MultisigService};
use crate::transaction::{PendingTransaction, TransactionPayload};
use crate::validation::{ValidationErrors, Violation};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

/// Shared application state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub service: MultisigService,
}

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<Violation>,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

/// Map a coordinator error to its HTTP status and JSON body
pub fn error_response(err: CoordinatorError) -> (StatusCode, Json<ApiError>) {
    let status = match &err {
        CoordinatorError::Validation(_) => StatusCode::BAD_REQUEST,
        CoordinatorError::NotFound { .. } => StatusCode::NOT_FOUND,
        CoordinatorError::InvalidState(_) => StatusCode::CONFLICT,
        CoordinatorError::Unauthorized(_) => StatusCode::FORBIDDEN,
        CoordinatorError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        CoordinatorError::Chain(_) => StatusCode::BAD_GATEWAY,
        CoordinatorError::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
        CoordinatorError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let violations = match &err {
        CoordinatorError::Validation(errors) => errors.violations().to_vec(),
        _ => Vec::new(),
    };
    if status.is_server_error() {
        log::warn!("Request failed: {}", err);
    }

    (
        status,
        Json(ApiError {
            error: err.to_string(),
            kind: err.kind(),
            violations,
        }),
    )
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub account: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub threshold: u32,
    pub members: Vec<Member>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    pub account_id: String,
    pub payload: TransactionPayload,
    #[serde(default)]
    pub memo: Option<String>,
}

/// A member's signature over the transaction's sign document
#[derive(Debug, Deserialize)]
pub struct SubmitSignatureRequest {
    pub signer: String,
    /// Compact secp256k1 signature (hex)
    pub signature: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateProposalRequest {
    pub account_id: String,
    pub proposer: String,
    pub title: String,
    pub description: String,
    pub action: ProposalAction,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub voter: String,
    pub choice: VoteChoice,
}

// ============================================================================
// Health
// ============================================================================

pub async fn health_check() -> &'static str {
    "OK"
}

// ============================================================================
// Accounts
// ============================================================================

pub async fn create_account(
    State(state): State<ApiState>,
    Json(req): Json<CreateAccountRequest>,
) -> ApiResult<(StatusCode, Json<MultisigAccount>)> {
    let account = state
        .service
        .accounts()
        .create(req.threshold, req.members)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn list_accounts(State(state): State<ApiState>) -> ApiResult<Json<Vec<MultisigAccount>>> {
    state
        .service
        .accounts()
        .list()
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn get_account(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MultisigAccount>> {
    state
        .service
        .accounts()
        .get(&id)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn refresh_account(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MultisigAccount>> {
    state
        .service
        .accounts()
        .refresh_balance(&id)
        .await
        .map(Json)
        .map_err(error_response)
}

// ============================================================================
// Transactions
// ============================================================================

pub async fn create_transaction(
    State(state): State<ApiState>,
    Json(req): Json<CreateTransactionRequest>,
) -> ApiResult<(StatusCode, Json<PendingTransaction>)> {
    let tx = state
        .service
        .transactions()
        .create(&req.account_id, req.payload, req.memo)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(tx)))
}

pub async fn list_transactions(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<PendingTransaction>>> {
    state
        .service
        .transactions()
        .list(query.account.as_deref())
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn get_transaction(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PendingTransaction>> {
    state
        .service
        .transactions()
        .get(&id)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn get_sign_doc(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SignDoc>> {
    state
        .service
        .transactions()
        .sign_doc(&id)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Accept an externally produced signature. It is checked against the key
/// recorded in the signer's slot before it is stored.
pub async fn submit_signature(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(req): Json<SubmitSignatureRequest>,
) -> ApiResult<Json<PendingTransaction>> {
    let coordinator = state.service.transactions();
    let signature = hex::decode(&req.signature).map_err(|_| {
        error_response(ValidationErrors::single("signature", "signature is not valid hex").into())
    })?;

    let tx = coordinator.get(&id).await.map_err(error_response)?;
    let mut signer = PresignedSigner::new(req.signer.as_str(), signature);
    if let Some(public_key) = tx
        .slot(&req.signer)
        .and_then(|slot| hex::decode(&slot.public_key).ok())
    {
        signer = signer.with_public_key(public_key);
    }

    coordinator
        .sign(&id, &signer)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn broadcast_transaction(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PendingTransaction>> {
    state
        .service
        .transactions()
        .broadcast(&id)
        .await
        .map(Json)
        .map_err(error_response)
}

// ============================================================================
// Proposals
// ============================================================================

pub async fn create_proposal(
    State(state): State<ApiState>,
    Json(req): Json<CreateProposalRequest>,
) -> ApiResult<(StatusCode, Json<Proposal>)> {
    let proposal = state
        .service
        .proposals()
        .create(
            &req.account_id,
            &req.proposer,
            &req.title,
            &req.description,
            req.action,
        )
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(proposal)))
}

pub async fn list_proposals(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Proposal>>> {
    state
        .service
        .proposals()
        .list(query.account.as_deref())
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn get_proposal(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Proposal>> {
    state
        .service
        .proposals()
        .get(&id)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn vote_proposal(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(req): Json<VoteRequest>,
) -> ApiResult<Json<Proposal>> {
    state
        .service
        .proposals()
        .vote(&id, &req.voter, req.choice)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn execute_proposal(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Proposal>> {
    state
        .service
        .proposals()
        .execute(&id)
        .await
        .map(Json)
        .map_err(error_response)
}

// ============================================================================
// Maintenance
// ============================================================================

pub async fn run_cleanup(State(state): State<ApiState>) -> ApiResult<Json<CleanupReport>> {
    state.service.cleanup().await.map(Json).map_err(error_response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{ChainError, Signer};
    use crate::service::fixtures::Harness;
    use crate::transaction::TransactionStatus;

    #[test]
    fn test_status_mapping() {
        let cases = vec![
            (
                CoordinatorError::Validation(ValidationErrors::single("memo", "too long")),
                StatusCode::BAD_REQUEST,
            ),
            (CoordinatorError::not_found("account", "x"), StatusCode::NOT_FOUND),
            (
                CoordinatorError::InvalidState("broadcast".into()),
                StatusCode::CONFLICT,
            ),
            (
                CoordinatorError::Unauthorized("outsider".into()),
                StatusCode::FORBIDDEN,
            ),
            (
                CoordinatorError::RateLimited {
                    operation: "tx_create",
                    key: "tx_create:a".into(),
                },
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (
                CoordinatorError::Chain(ChainError::Query("down".into())),
                StatusCode::BAD_GATEWAY,
            ),
            (
                CoordinatorError::Unsupported("transfer".into()),
                StatusCode::NOT_IMPLEMENTED,
            ),
            (
                CoordinatorError::Internal("storage failure".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(error_response(err).0, expected);
        }
    }

    #[test]
    fn test_violations_in_body() {
        let mut errors = ValidationErrors::new();
        errors.push("threshold", "threshold must be at least 1");
        errors.push("members", "need at least 2 members, got 1");

        let (_, Json(body)) = error_response(errors.into());
        assert_eq!(body.kind, "validation");
        assert_eq!(body.violations.len(), 2);
        assert_eq!(body.violations[0].field, "threshold");
    }

    #[tokio::test]
    async fn test_submit_external_signatures() {
        let h = Harness::new();
        let state = ApiState {
            service: h.service.clone(),
        };
        let account = h.account(2, 3).await;
        let (status, Json(tx)) = create_transaction(
            State(state.clone()),
            Json(CreateTransactionRequest {
                account_id: account.id.clone(),
                payload: h.transfer(42),
                memo: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let Json(doc) = get_sign_doc(State(state.clone()), Path(tx.id.clone()))
            .await
            .unwrap();
        let bytes = doc.to_bytes().unwrap();

        // Signature by key 1 claimed for member 0 fails verification
        let forged = submit_signature(
            State(state.clone()),
            Path(tx.id.clone()),
            Json(SubmitSignatureRequest {
                signer: h.signers[0].address().to_string(),
                signature: hex::encode(h.keys[1].sign(&bytes).unwrap()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(forged.0, StatusCode::BAD_GATEWAY);

        for i in 0..2 {
            submit_signature(
                State(state.clone()),
                Path(tx.id.clone()),
                Json(SubmitSignatureRequest {
                    signer: h.signers[i].address().to_string(),
                    signature: hex::encode(h.keys[i].sign(&bytes).unwrap()),
                }),
            )
            .await
            .unwrap();
        }

        let Json(tx) = broadcast_transaction(State(state), Path(tx.id.clone()))
            .await
            .unwrap();
        assert_eq!(tx.status, TransactionStatus::Broadcast);
    }

    #[tokio::test]
    async fn test_bad_signature_hex_is_validation_error() {
        let h = Harness::new();
        let state = ApiState {
            service: h.service.clone(),
        };
        let (status, Json(body)) = submit_signature(
            State(state),
            Path("whatever".to_string()),
            Json(SubmitSignatureRequest {
                signer: "cosmos1x".to_string(),
                signature: "zz".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.violations.iter().any(|v| v.field == "signature"));
    }
}
