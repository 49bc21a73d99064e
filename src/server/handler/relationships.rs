//! Endpoints of the relationship graph

use actix_toolbox::tb_middleware::Session;
use actix_web::web::{Data, Json, Path, Query};
use actix_web::{delete, get, patch, post, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::graph::{Page, PageLimits, PageRequest, RelationshipView};
use crate::models::RelationshipStatus;
use crate::server::handler::{
    session_uuid, AccountResponse, ApiErrorResponse, ApiResult, PathUuid,
};
use crate::server::Graph;

/// Pagination and search parameters of the listings
#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationQuery {
    /// The 1-based page, defaults to 1
    #[param(example = 1, minimum = 1)]
    page: Option<u64>,
    /// The page size, defaults to the configured page size
    #[param(example = 10, minimum = 1)]
    limit: Option<u64>,
    /// Only include accounts whose display name or username contains this term
    #[param(example = "herb")]
    search: Option<String>,
}

impl PaginationQuery {
    fn page_request(&self, limits: &PageLimits) -> ApiResult<PageRequest> {
        Ok(PageRequest::new(
            self.page,
            self.limit,
            self.search.as_deref(),
            limits,
        )?)
    }
}

/// The request to send a friend request
#[derive(Deserialize, ToSchema)]
pub struct CreateFriendRequest {
    /// The account that should receive the request
    receiver_uuid: Uuid,
}

/// The request to block an account
#[derive(Deserialize, ToSchema)]
pub struct CreateBlockRequest {
    /// The account that should be blocked
    target_uuid: Uuid,
}

/// A relationship between two accounts
#[derive(Serialize, ToSchema)]
pub struct RelationshipResponse {
    uuid: Uuid,
    status: RelationshipStatus,
    sender: AccountResponse,
    receiver: AccountResponse,
    created_at: DateTime<Utc>,
}

impl From<RelationshipView> for RelationshipResponse {
    fn from(value: RelationshipView) -> Self {
        Self {
            uuid: value.uuid,
            status: value.status,
            sender: value.sender.into(),
            receiver: value.receiver.into(),
            created_at: value.created_at,
        }
    }
}

/// A page of friend requests
#[derive(Serialize, ToSchema)]
pub struct FriendRequestsResponse {
    requests: Vec<RelationshipResponse>,
    #[schema(example = 42)]
    total: u64,
    #[schema(example = 1)]
    page: u64,
    #[schema(example = 10)]
    limit: u64,
}

impl From<Page<RelationshipView>> for FriendRequestsResponse {
    fn from(value: Page<RelationshipView>) -> Self {
        let page = value.map(RelationshipResponse::from);
        Self {
            requests: page.items,
            total: page.total,
            page: page.page,
            limit: page.limit,
        }
    }
}

/// An accepted friendship seen from one of its parties
#[derive(Serialize, ToSchema)]
pub struct FriendResponse {
    /// The uuid of the relationship
    uuid: Uuid,
    /// The other party
    friend: AccountResponse,
    /// When the request was sent
    created_at: DateTime<Utc>,
    /// When the request was accepted
    friends_since: DateTime<Utc>,
}

/// A page of friends
#[derive(Serialize, ToSchema)]
pub struct FriendsResponse {
    friends: Vec<FriendResponse>,
    #[schema(example = 42)]
    total: u64,
    #[schema(example = 1)]
    page: u64,
    #[schema(example = 10)]
    limit: u64,
}

/// Send a friend request to another account
///
/// The request fails if there's any relationship between both accounts,
/// no matter who initiated it.
#[utoipa::path(
    tag = "Relationships",
    context_path = "/api/v1",
    responses(
        (status = 201, description = "Friend request has been created"),
        (status = 400, description = "Client error", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    request_body = CreateFriendRequest,
    security(("session_cookie" = []))
)]
#[post("/relationships/requests")]
pub async fn send_friend_request(
    req: Json<CreateFriendRequest>,
    graph: Data<Graph>,
    session: Session,
) -> ApiResult<HttpResponse> {
    let uuid = session_uuid(&session)?;

    graph.send_friend_request(uuid, req.receiver_uuid).await?;

    Ok(HttpResponse::Created().finish())
}

/// Retrieve the pending friend requests the executing account has received
#[utoipa::path(
    tag = "Relationships",
    context_path = "/api/v1",
    responses(
        (status = 200, description = "Received friend requests, newest first", body = FriendRequestsResponse),
        (status = 400, description = "Client error", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    params(PaginationQuery),
    security(("session_cookie" = []))
)]
#[get("/relationships/requests")]
pub async fn get_incoming_requests(
    query: Query<PaginationQuery>,
    graph: Data<Graph>,
    session: Session,
) -> ApiResult<Json<FriendRequestsResponse>> {
    let uuid = session_uuid(&session)?;
    let page = query.page_request(graph.limits())?;

    let requests = graph.list_incoming_requests(uuid, &page).await?;

    Ok(Json(requests.into()))
}

/// Retrieve the pending friend requests the executing account has sent
#[utoipa::path(
    tag = "Relationships",
    context_path = "/api/v1",
    responses(
        (status = 200, description = "Sent friend requests, newest first", body = FriendRequestsResponse),
        (status = 400, description = "Client error", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    params(PaginationQuery),
    security(("session_cookie" = []))
)]
#[get("/relationships/requests/sent")]
pub async fn get_sent_requests(
    query: Query<PaginationQuery>,
    graph: Data<Graph>,
    session: Session,
) -> ApiResult<Json<FriendRequestsResponse>> {
    let uuid = session_uuid(&session)?;
    let page = query.page_request(graph.limits())?;

    let requests = graph.list_sent_requests(uuid, &page).await?;

    Ok(Json(requests.into()))
}

/// Retrieve a single friend request addressed to the executing account
///
/// Requests sent by the executing account can't be retrieved here.
#[utoipa::path(
    tag = "Relationships",
    context_path = "/api/v1",
    responses(
        (status = 200, description = "The friend request", body = RelationshipResponse),
        (status = 404, description = "No such request", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    params(PathUuid),
    security(("session_cookie" = []))
)]
#[get("/relationships/requests/{uuid}")]
pub async fn get_friend_request(
    path: Path<PathUuid>,
    graph: Data<Graph>,
    session: Session,
) -> ApiResult<Json<RelationshipResponse>> {
    let uuid = session_uuid(&session)?;

    let request = graph.get_request(uuid, path.uuid).await?;

    Ok(Json(request.into()))
}

/// Accept a friend request addressed to the executing account
#[utoipa::path(
    tag = "Relationships",
    context_path = "/api/v1",
    responses(
        (status = 200, description = "The accounts are friends now"),
        (status = 404, description = "No such request", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    params(PathUuid),
    security(("session_cookie" = []))
)]
#[patch("/relationships/requests/{uuid}/accept")]
pub async fn accept_friend_request(
    path: Path<PathUuid>,
    graph: Data<Graph>,
    session: Session,
) -> ApiResult<HttpResponse> {
    let uuid = session_uuid(&session)?;

    graph.accept_friend_request(uuid, path.uuid).await?;

    Ok(HttpResponse::Ok().finish())
}

/// Reject a friend request addressed to the executing account
///
/// The request is deleted, a new one may be sent afterwards.
#[utoipa::path(
    tag = "Relationships",
    context_path = "/api/v1",
    responses(
        (status = 200, description = "The request has been rejected"),
        (status = 404, description = "No such request", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    params(PathUuid),
    security(("session_cookie" = []))
)]
#[delete("/relationships/requests/{uuid}")]
pub async fn reject_friend_request(
    path: Path<PathUuid>,
    graph: Data<Graph>,
    session: Session,
) -> ApiResult<HttpResponse> {
    let uuid = session_uuid(&session)?;

    graph.reject_friend_request(uuid, path.uuid).await?;

    Ok(HttpResponse::Ok().finish())
}

/// Block another account
///
/// Pending requests and friendships between both accounts are removed.
/// A block issued by the other account is replaced as well.
#[utoipa::path(
    tag = "Relationships",
    context_path = "/api/v1",
    responses(
        (status = 201, description = "The account has been blocked"),
        (status = 400, description = "Client error", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    request_body = CreateBlockRequest,
    security(("session_cookie" = []))
)]
#[post("/relationships/blocks")]
pub async fn block_account(
    req: Json<CreateBlockRequest>,
    graph: Data<Graph>,
    session: Session,
) -> ApiResult<HttpResponse> {
    let uuid = session_uuid(&session)?;

    graph.block_user(uuid, req.target_uuid).await?;

    Ok(HttpResponse::Created().finish())
}

/// Retrieve the friends of the executing account
#[utoipa::path(
    tag = "Relationships",
    context_path = "/api/v1",
    responses(
        (status = 200, description = "Friends, newest friendship request first", body = FriendsResponse),
        (status = 400, description = "Client error", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    params(PaginationQuery),
    security(("session_cookie" = []))
)]
#[get("/relationships/friends")]
pub async fn get_friends(
    query: Query<PaginationQuery>,
    graph: Data<Graph>,
    session: Session,
) -> ApiResult<Json<FriendsResponse>> {
    let uuid = session_uuid(&session)?;
    let page = query.page_request(graph.limits())?;

    let friends = graph.list_friends(uuid, &page).await?.map(|view| {
        let friend = view.other_party(uuid).clone();
        FriendResponse {
            uuid: view.uuid,
            friend: friend.into(),
            created_at: view.created_at,
            friends_since: view.updated_at,
        }
    });

    Ok(Json(FriendsResponse {
        friends: friends.items,
        total: friends.total,
        page: friends.page,
        limit: friends.limit,
    }))
}
