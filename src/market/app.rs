use crate::files::image_host::ImageHostClient;
use crate::market::handlers::postgres_handler::PostgresHandler;
use crate::market::types::post::{Comment, Post, SortPost};
use crate::shared::types::app::{ErrorResponse, Response, forbidden, bad_request, not_found, server_error};
use crate::shared::types::account::Role;
use crate::shared::util::auth::{self, Caller};
use crate::shared::util::clean_text::clean_text;
use crate::shared::util::config;

use actix_web::{
    get, post, put, delete, HttpResponse, web::{self, Data},
    Result
};

use serde::{Serialize, Deserialize};
use uuid::Uuid;

#[derive(Serialize)]
struct ResponseWithId {
    success: bool,
    id: Uuid
}

// Create a new post
#[derive(Deserialize)]
struct CreatePostForm {
    title: String,
    desc: String,
    price_cents: i64,
    image_url: String,
    image_delete_handle: String
}

#[post("/v1/market/posts")]
pub async fn create_post(handler: Data<PostgresHandler>, caller: Caller, params: web::Json<CreatePostForm>) -> Result<HttpResponse> {
    let Caller(caller) = caller;
    if let Err(err) = auth::require_permission(&caller, "create_post") {
        return Ok(auth::error_response(&err));
    }

    let config = config::get_config();
    if params.title.is_empty() || params.title.len() > config.count.max_title_length {
        bad_request!("Title is missing or too long");
    }
    if params.desc.len() > config.count.max_description_length {
        bad_request!("Description is too long");
    }
    if params.price_cents < 0 || params.price_cents > config.market.max_price_cents {
        bad_request!("Price is out of range");
    }
    if params.image_url.is_empty() {
        bad_request!("Post has no image");
    }

    match handler.create_post(
        &caller.id,
        params.title.clone(),
        clean_text(params.desc.as_str()),
        params.price_cents,
        params.image_url.clone(),
        params.image_delete_handle.clone()
    ).await {
        Ok(result) => Ok(HttpResponse::Created().json(ResponseWithId { success: true, id: result.id })),
        Err(_err) => server_error!("Error creating post")
    }
}

// Update a post
#[derive(Deserialize)]
struct UpdatePostForm {
    id: Uuid,
    title: Option<String>,
    desc: Option<String>,
    price_cents: Option<i64>
}

#[put("/v1/market/posts")]
pub async fn update_post(handler: Data<PostgresHandler>, caller: Caller, params: web::Json<UpdatePostForm>) -> Result<HttpResponse> {
    let Caller(caller) = caller;

    let post = match handler.get_post(&params.id).await {
        Some(post) => post,
        None => not_found!("Post does not exist")
    };
    // Only owner or an admin can touch a post
    if auth::assert_can_mutate(&caller, &post.owner).is_err() {
        forbidden!("You do not have permission to update this post");
    }

    let config = config::get_config();
    if let Some(title) = &params.title {
        if title.is_empty() || title.len() > config.count.max_title_length {
            bad_request!("Title is missing or too long");
        }
    }
    if params.desc.as_ref().map(|d| d.len() > config.count.max_description_length).unwrap_or(false) {
        bad_request!("Description is too long");
    }
    if let Some(price_cents) = params.price_cents {
        if price_cents < 0 || price_cents > config.market.max_price_cents {
            bad_request!("Price is out of range");
        }
    }

    match handler.modify_post(
        &params.id,
        params.title.clone(),
        params.desc.as_ref().map(|d| clean_text(d)),
        params.price_cents
    ).await {
        Ok(result) => Ok(HttpResponse::Ok().json(ResponseWithId { success: true, id: result.id })),
        Err(_err) => server_error!("Error updating post")
    }
}

// Delete a post
#[derive(Deserialize)]
struct PostIdForm { id: Uuid }

#[delete("/v1/market/posts")]
pub async fn delete_post(handler: Data<PostgresHandler>, image_host: Data<ImageHostClient>,
        caller: Caller, params: web::Json<PostIdForm>) -> Result<HttpResponse> {
    let Caller(caller) = caller;

    let post = match handler.get_post(&params.id).await {
        Some(post) => post,
        None => not_found!("Post does not exist")
    };
    if auth::assert_can_mutate(&caller, &post.owner).is_err() {
        forbidden!("You do not have permission to delete this post");
    }

    match handler.delete_post(&params.id).await {
        Ok(_) => {
            // Best effort: a stale remote image is not worth failing the
            // delete over
            if let Err(err) = image_host.delete(&post.image_delete_handle).await {
                log::warn!("failed to delete remote image for post {}: {:?}", post.id, err);
            }
            Ok(HttpResponse::Ok().json(Response::ok("Deleted")))
        },
        Err(_err) => server_error!("Error deleting post")
    }
}

// Approve or reject a post
#[derive(Deserialize)]
struct ApprovePostForm {
    id: Uuid,
    approved: bool
}

#[put("/v1/market/posts/approve")]
pub async fn approve_post(handler: Data<PostgresHandler>, caller: Caller, params: web::Json<ApprovePostForm>) -> Result<HttpResponse> {
    let Caller(caller) = caller;
    if let Err(err) = auth::require_permission(&caller, "approve_post") {
        return Ok(auth::error_response(&err));
    }

    if handler.get_post(&params.id).await.is_none() {
        not_found!("Post does not exist");
    }

    match handler.set_approved(&params.id, params.approved).await {
        Ok(result) => Ok(HttpResponse::Ok().json(ResponseWithId { success: true, id: result.id })),
        Err(_err) => server_error!("Error approving post")
    }
}

// Get posts
#[derive(Deserialize)]
struct SearchPostForm {
    offset: Option<u32>,
    limit: Option<u32>,
    owner: Option<Uuid>,
    query: Option<String>,
    sort_by: Option<SortPost>,
    sort_down: Option<bool>
}

#[derive(Serialize)]
struct SearchPostReturn {
    success: bool,
    posts: Vec<Post>
}

#[derive(Serialize)]
struct PostReturn {
    success: bool,
    post: Post
}

#[get("/v1/market/posts")]
pub async fn get_posts(handler: Data<PostgresHandler>, caller: Option<Caller>, params: web::Query<SearchPostForm>) -> Result<HttpResponse> {
    // Anonymous callers can browse, they just see approved posts only
    let viewer = caller.as_ref().map(|caller| caller.0.id);
    let moderator = caller.as_ref()
        .map(|caller| caller.0.role == Role::Manager || caller.0.role == Role::Admin)
        .unwrap_or(false);

    match handler.get_posts(
        viewer,
        moderator,
        &params.owner,
        &params.query,
        params.offset,
        params.limit,
        params.sort_by.clone(),
        params.sort_down
    ).await {
        Ok(posts) => Ok(HttpResponse::Ok().json(SearchPostReturn { success: true, posts })),
        Err(_err) => server_error!("Failed to search for posts")
    }
}

#[get("/v1/market/posts/single")]
pub async fn get_post(handler: Data<PostgresHandler>, caller: Option<Caller>, params: web::Query<PostIdForm>) -> Result<HttpResponse> {
    let post = match handler.get_post(&params.id).await {
        Some(post) => post,
        None => not_found!("Post does not exist")
    };

    // Unapproved posts are invisible to everyone but their owner and
    // the people who review them
    if !post.approved {
        let visible = match &caller {
            Some(Caller(account)) => account.id == post.owner ||
                account.role == Role::Manager || account.role == Role::Admin,
            None => false
        };
        if !visible {
            not_found!("Post does not exist");
        }
    }

    Ok(HttpResponse::Ok().json(PostReturn { success: true, post }))
}

// Purchase a post
#[post("/v1/market/posts/purchase")]
pub async fn purchase_post(handler: Data<PostgresHandler>, caller: Caller, params: web::Json<PostIdForm>) -> Result<HttpResponse> {
    let Caller(caller) = caller;
    if let Err(err) = auth::require_permission(&caller, "purchase_post") {
        return Ok(auth::error_response(&err));
    }

    let post = match handler.get_post(&params.id).await {
        Some(post) => post,
        None => not_found!("Post does not exist")
    };
    if !post.approved {
        bad_request!("Post is not for sale");
    }
    if post.owner == caller.id {
        bad_request!("You cannot purchase your own post");
    }

    match handler.purchase(&post.id, &caller.id, post.price_cents).await {
        Ok(true) => Ok(HttpResponse::Ok().json(Response::ok("Purchased"))),
        Ok(false) => bad_request!("You already purchased this post"),
        Err(_err) => server_error!("Error purchasing post")
    }
}

#[derive(Deserialize)]
struct PageForm {
    offset: Option<u32>,
    limit: Option<u32>
}

#[get("/v1/market/purchases")]
pub async fn get_purchases(handler: Data<PostgresHandler>, caller: Caller, params: web::Query<PageForm>) -> Result<HttpResponse> {
    let Caller(caller) = caller;
    match handler.get_purchases(&caller.id, params.offset, params.limit).await {
        Ok(posts) => Ok(HttpResponse::Ok().json(SearchPostReturn { success: true, posts })),
        Err(_err) => server_error!("Failed to get purchases")
    }
}

// ------------------- Favorites ---------------------

#[derive(Deserialize)]
struct FavoritesForm { ids: Vec<Uuid> }

#[post("/v1/market/favorites")]
pub async fn add_favorites(handler: Data<PostgresHandler>, caller: Caller, params: web::Json<FavoritesForm>) -> Result<HttpResponse> {
    let Caller(caller) = caller;
    if let Err(err) = auth::require_permission(&caller, "favorite_post") {
        return Ok(auth::error_response(&err));
    }

    match handler.add_favorites(&caller.id, &params.ids).await {
        Ok(()) => Ok(HttpResponse::Ok().json(Response::ok("Favorites added"))),
        Err(_err) => server_error!("Failed to add favorites")
    }
}

#[delete("/v1/market/favorites")]
pub async fn remove_favorites(handler: Data<PostgresHandler>, caller: Caller, params: web::Json<FavoritesForm>) -> Result<HttpResponse> {
    let Caller(caller) = caller;
    match handler.remove_favorites(&caller.id, &params.ids).await {
        Ok(()) => Ok(HttpResponse::Ok().json(Response::ok("Favorites removed"))),
        Err(_err) => server_error!("Failed to remove favorites")
    }
}

#[get("/v1/market/favorites")]
pub async fn get_favorites(handler: Data<PostgresHandler>, caller: Caller, params: web::Query<PageForm>) -> Result<HttpResponse> {
    let Caller(caller) = caller;
    match handler.get_favorites(&caller.id, params.offset, params.limit).await {
        Ok(posts) => Ok(HttpResponse::Ok().json(SearchPostReturn { success: true, posts })),
        Err(_err) => server_error!("Failed to get favorites")
    }
}

// ------------------- Ratings + comments ---------------------

#[derive(Deserialize)]
struct RatePostForm {
    id: Uuid,
    stars: i32
}

#[post("/v1/market/posts/rate")]
pub async fn rate_post(handler: Data<PostgresHandler>, caller: Caller, params: web::Json<RatePostForm>) -> Result<HttpResponse> {
    let Caller(caller) = caller;
    if let Err(err) = auth::require_permission(&caller, "rate_post") {
        return Ok(auth::error_response(&err));
    }

    if params.stars < 1 || params.stars > 5 {
        bad_request!("Rating must be between 1 and 5 stars");
    }
    if handler.get_post(&params.id).await.is_none() {
        not_found!("Post does not exist");
    }

    match handler.rate_post(&caller.id, &params.id, params.stars).await {
        Ok(()) => Ok(HttpResponse::Ok().json(Response::ok("Rated"))),
        Err(_err) => server_error!("Failed to rate post")
    }
}

#[derive(Deserialize)]
struct CreateCommentForm {
    id: Uuid,
    content: String
}

#[post("/v1/market/posts/comments")]
pub async fn create_comment(handler: Data<PostgresHandler>, caller: Caller, params: web::Json<CreateCommentForm>) -> Result<HttpResponse> {
    let Caller(caller) = caller;
    if let Err(err) = auth::require_permission(&caller, "comment_post") {
        return Ok(auth::error_response(&err));
    }

    let content = clean_text(params.content.as_str());
    if content.is_empty() || content.len() > config::get_config().count.max_comment_length {
        bad_request!("Comment is empty or too long");
    }
    if handler.get_post(&params.id).await.is_none() {
        not_found!("Post does not exist");
    }

    match handler.create_comment(&params.id, &caller.id, content).await {
        Ok(comment) => Ok(HttpResponse::Created().json(CommentReturn { success: true, comment })),
        Err(_err) => server_error!("Failed to create comment")
    }
}

#[derive(Serialize)]
struct CommentReturn {
    success: bool,
    comment: Comment
}

#[derive(Deserialize)]
struct CommentSearchForm {
    id: Uuid,
    offset: Option<u32>,
    limit: Option<u32>
}

#[derive(Serialize)]
struct CommentSearchReturn {
    success: bool,
    comments: Vec<Comment>
}

#[get("/v1/market/posts/comments")]
pub async fn get_comments(handler: Data<PostgresHandler>, params: web::Query<CommentSearchForm>) -> Result<HttpResponse> {
    match handler.get_comments(&params.id, params.offset, params.limit).await {
        Ok(comments) => Ok(HttpResponse::Ok().json(CommentSearchReturn { success: true, comments })),
        Err(_err) => server_error!("Failed to get comments")
    }
}

#[derive(Deserialize)]
struct CommentIdForm { id: i32 }

#[delete("/v1/market/posts/comments")]
pub async fn delete_comment(handler: Data<PostgresHandler>, caller: Caller, params: web::Json<CommentIdForm>) -> Result<HttpResponse> {
    let Caller(caller) = caller;

    let comment = match handler.get_comment(params.id).await {
        Some(comment) => comment,
        None => not_found!("Comment does not exist")
    };
    // Comment author or an admin can remove it
    if auth::assert_can_mutate(&caller, &comment.author).is_err() {
        forbidden!("You do not have permission to delete this comment");
    }

    match handler.delete_comment(params.id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(Response::ok("Deleted"))),
        Err(_err) => server_error!("Failed to delete comment")
    }
}
