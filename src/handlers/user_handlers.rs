use crate::error::{ActionError, AppError};
use crate::handlers::{
    display_date, listing_redirect, parse_id, read_failure, DeleteForm, ListingQuery,
};
use crate::middleware::{get_or_create_csrf_token, validate_csrf_form_field};
use crate::models::{Role, User, UserForm};
use crate::services::USERS_LISTING;
use crate::validation::FormErrors;
use crate::AppState;
use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use tower_sessions::Session;
use tracing::debug;

// Row as shown in the listing
struct UserRow {
    id: i64,
    name: String,
    email: String,
    role: &'static str,
    created: String,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        UserRow {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.as_str(),
            created: display_date(&user.created_at),
        }
    }
}

#[derive(Template)]
#[template(path = "users/_rows.html")]
struct UserRowsTemplate {
    users: Vec<UserRow>,
}

#[derive(Template)]
#[template(path = "users/list.html")]
struct UsersPageTemplate {
    active: &'static str,
    csrf_token: String,
    notice: Option<String>,
    error: Option<String>,
    rows: String,
}

#[derive(Template)]
#[template(path = "users/form.html")]
struct UserFormTemplate {
    active: &'static str,
    heading: String,
    action: String,
    submit_label: &'static str,
    csrf_token: String,
    form: UserForm,
    errors: FormErrors,
    roles: [Role; 3],
}

impl UserFormTemplate {
    fn create(csrf_token: String, form: UserForm, errors: FormErrors) -> Self {
        UserFormTemplate {
            active: "users",
            heading: "New user".to_string(),
            action: "/users".to_string(),
            submit_label: "Create user",
            csrf_token,
            form,
            errors,
            roles: Role::ALL,
        }
    }

    fn edit(id: i64, csrf_token: String, form: UserForm, errors: FormErrors) -> Self {
        UserFormTemplate {
            active: "users",
            heading: format!("Edit user #{}", id),
            action: format!("/users/{}", id),
            submit_label: "Save changes",
            csrf_token,
            form,
            errors,
            roles: Role::ALL,
        }
    }
}

/// Listing fragment, served from the view cache while it is fresh.
async fn user_rows(state: &AppState) -> Result<String, AppError> {
    if let Some(rows) = state.view_cache.get(USERS_LISTING) {
        return Ok(rows);
    }

    let ticket = state.view_cache.ticket(USERS_LISTING);
    let users = state.user_service.list_users().await.map_err(read_failure)?;
    let rows = UserRowsTemplate {
        users: users.iter().map(UserRow::from).collect(),
    }
    .render()?;

    if !state.view_cache.store(ticket, rows.clone()) {
        debug!("Users listing changed while rendering; fragment not cached");
    }

    Ok(rows)
}

// Handlers

/// GET /users - List users, newest first
pub async fn list_users_page(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ListingQuery>,
) -> Result<Html<String>, AppError> {
    let rows = user_rows(&state).await?;
    let csrf_token = get_or_create_csrf_token(&session).await?;

    let template = UsersPageTemplate {
        active: "users",
        csrf_token,
        notice: query.notice,
        error: query.error,
        rows,
    };

    Ok(Html(template.render()?))
}

/// GET /users/new - Display create user form
pub async fn new_user_page(session: Session) -> Result<Html<String>, AppError> {
    let csrf_token = get_or_create_csrf_token(&session).await?;
    let form = UserForm {
        role: Role::default().to_string(),
        ..UserForm::default()
    };

    Ok(Html(
        UserFormTemplate::create(csrf_token, form, FormErrors::new()).render()?,
    ))
}

/// POST /users - Create user
pub async fn create_user_handler(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UserForm>,
) -> Result<Response, AppError> {
    validate_csrf_form_field(&session, &form.csrf_token).await?;

    match state.user_service.create_user(&form).await {
        Ok(_) => Ok(Redirect::to(USERS_LISTING).into_response()),
        Err(ActionError::NotFound) => Err(AppError::NotFound),
        Err(err) => {
            let status = err.status();
            let csrf_token = get_or_create_csrf_token(&session).await?;
            let template = UserFormTemplate::create(csrf_token, form, err.into_form_errors());
            Ok((status, Html(template.render()?)).into_response())
        }
    }
}

/// GET /users/{id}/edit - Display edit form prefilled with the stored user
pub async fn edit_user_page(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id = parse_id(&id).ok_or(AppError::NotFound)?;
    let user = state.user_service.get_user(id).await.map_err(read_failure)?;
    let csrf_token = get_or_create_csrf_token(&session).await?;

    Ok(Html(
        UserFormTemplate::edit(id, csrf_token, UserForm::from(&user), FormErrors::new())
            .render()?,
    ))
}

/// POST /users/{id} - Update user
pub async fn update_user_handler(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<UserForm>,
) -> Result<Response, AppError> {
    validate_csrf_form_field(&session, &form.csrf_token).await?;
    let id = parse_id(&id).ok_or(AppError::NotFound)?;

    match state.user_service.update_user(id, &form).await {
        Ok(_) => Ok(Redirect::to(USERS_LISTING).into_response()),
        Err(ActionError::NotFound) => Err(AppError::NotFound),
        Err(err) => {
            let status = err.status();
            let csrf_token = get_or_create_csrf_token(&session).await?;
            let template = UserFormTemplate::edit(id, csrf_token, form, err.into_form_errors());
            Ok((status, Html(template.render()?)).into_response())
        }
    }
}

/// POST /users/{id}/delete - Delete user, then return to the listing
pub async fn delete_user_handler(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<DeleteForm>,
) -> Result<Redirect, AppError> {
    validate_csrf_form_field(&session, &form.csrf_token).await?;

    let Some(id) = parse_id(&id) else {
        return Ok(listing_redirect(USERS_LISTING, "error", "User not found"));
    };

    Ok(match state.user_service.delete_user(id).await {
        Ok(()) => listing_redirect(USERS_LISTING, "notice", "User deleted"),
        Err(ActionError::NotFound) => listing_redirect(USERS_LISTING, "error", "User not found"),
        Err(err) => listing_redirect(USERS_LISTING, "error", &err.to_string()),
    })
}
