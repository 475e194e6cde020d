use crate::error::{ActionError, AppError};
use crate::handlers::{
    display_date, listing_redirect, parse_id, read_failure, DeleteForm, ListingQuery,
};
use crate::middleware::{get_or_create_csrf_token, validate_csrf_form_field};
use crate::models::{Product, ProductForm};
use crate::services::PRODUCTS_LISTING;
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

struct ProductRow {
    id: i64,
    name: String,
    description: String, // Convert Option to String for templates
    price: String,
    stock: i64,
    stock_level: &'static str,
    image_url: String,
    updated: String,
}

impl From<&Product> for ProductRow {
    fn from(product: &Product) -> Self {
        ProductRow {
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: format!("{:.2}", product.price),
            stock: product.stock,
            stock_level: product.stock_level(),
            image_url: product.image_url.clone().unwrap_or_default(),
            updated: display_date(&product.updated_at),
        }
    }
}

#[derive(Template)]
#[template(path = "products/_rows.html")]
struct ProductRowsTemplate {
    products: Vec<ProductRow>,
}

#[derive(Template)]
#[template(path = "products/list.html")]
struct ProductsPageTemplate {
    active: &'static str,
    csrf_token: String,
    notice: Option<String>,
    error: Option<String>,
    rows: String,
}

#[derive(Template)]
#[template(path = "products/form.html")]
struct ProductFormTemplate {
    active: &'static str,
    heading: String,
    action: String,
    submit_label: &'static str,
    csrf_token: String,
    form: ProductForm,
    errors: FormErrors,
}

impl ProductFormTemplate {
    fn create(csrf_token: String, form: ProductForm, errors: FormErrors) -> Self {
        ProductFormTemplate {
            active: "products",
            heading: "New product".to_string(),
            action: "/products".to_string(),
            submit_label: "Create product",
            csrf_token,
            form,
            errors,
        }
    }

    fn edit(id: i64, csrf_token: String, form: ProductForm, errors: FormErrors) -> Self {
        ProductFormTemplate {
            active: "products",
            heading: format!("Edit product #{}", id),
            action: format!("/products/{}", id),
            submit_label: "Save changes",
            csrf_token,
            form,
            errors,
        }
    }
}

async fn product_rows(state: &AppState) -> Result<String, AppError> {
    if let Some(rows) = state.view_cache.get(PRODUCTS_LISTING) {
        return Ok(rows);
    }

    let ticket = state.view_cache.ticket(PRODUCTS_LISTING);
    let products = state
        .product_service
        .list_products()
        .await
        .map_err(read_failure)?;
    let rows = ProductRowsTemplate {
        products: products.iter().map(ProductRow::from).collect(),
    }
    .render()?;

    if !state.view_cache.store(ticket, rows.clone()) {
        debug!("Products listing changed while rendering; fragment not cached");
    }

    Ok(rows)
}

/// GET /products - Product catalog, newest first
pub async fn list_products_page(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ListingQuery>,
) -> Result<Html<String>, AppError> {
    let rows = product_rows(&state).await?;
    let csrf_token = get_or_create_csrf_token(&session).await?;

    let template = ProductsPageTemplate {
        active: "products",
        csrf_token,
        notice: query.notice,
        error: query.error,
        rows,
    };

    Ok(Html(template.render()?))
}

/// GET /products/new - Display create product form
pub async fn new_product_page(session: Session) -> Result<Html<String>, AppError> {
    let csrf_token = get_or_create_csrf_token(&session).await?;
    let form = ProductForm {
        stock: "0".to_string(),
        ..ProductForm::default()
    };

    Ok(Html(
        ProductFormTemplate::create(csrf_token, form, FormErrors::new()).render()?,
    ))
}

/// POST /products - Create product
pub async fn create_product_handler(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ProductForm>,
) -> Result<Response, AppError> {
    validate_csrf_form_field(&session, &form.csrf_token).await?;

    match state.product_service.create_product(&form).await {
        Ok(_) => Ok(Redirect::to(PRODUCTS_LISTING).into_response()),
        Err(ActionError::NotFound) => Err(AppError::NotFound),
        Err(err) => {
            let status = err.status();
            let csrf_token = get_or_create_csrf_token(&session).await?;
            let template = ProductFormTemplate::create(csrf_token, form, err.into_form_errors());
            Ok((status, Html(template.render()?)).into_response())
        }
    }
}

/// GET /products/{id}/edit - Display edit form prefilled with the stored product
pub async fn edit_product_page(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id = parse_id(&id).ok_or(AppError::NotFound)?;
    let product = state
        .product_service
        .get_product(id)
        .await
        .map_err(read_failure)?;
    let csrf_token = get_or_create_csrf_token(&session).await?;

    let template =
        ProductFormTemplate::edit(id, csrf_token, ProductForm::from(&product), FormErrors::new());
    Ok(Html(template.render()?))
}

/// POST /products/{id} - Update product
pub async fn update_product_handler(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<ProductForm>,
) -> Result<Response, AppError> {
    validate_csrf_form_field(&session, &form.csrf_token).await?;
    let id = parse_id(&id).ok_or(AppError::NotFound)?;

    match state.product_service.update_product(id, &form).await {
        Ok(_) => Ok(Redirect::to(PRODUCTS_LISTING).into_response()),
        Err(ActionError::NotFound) => Err(AppError::NotFound),
        Err(err) => {
            let status = err.status();
            let csrf_token = get_or_create_csrf_token(&session).await?;
            let template = ProductFormTemplate::edit(id, csrf_token, form, err.into_form_errors());
            Ok((status, Html(template.render()?)).into_response())
        }
    }
}

/// POST /products/{id}/delete - Delete product, then return to the catalog
pub async fn delete_product_handler(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<DeleteForm>,
) -> Result<Redirect, AppError> {
    validate_csrf_form_field(&session, &form.csrf_token).await?;

    let Some(id) = parse_id(&id) else {
        return Ok(listing_redirect(PRODUCTS_LISTING, "error", "Product not found"));
    };

    Ok(match state.product_service.delete_product(id).await {
        Ok(()) => listing_redirect(PRODUCTS_LISTING, "notice", "Product deleted"),
        Err(ActionError::NotFound) => {
            listing_redirect(PRODUCTS_LISTING, "error", "Product not found")
        }
        Err(err) => listing_redirect(PRODUCTS_LISTING, "error", &err.to_string()),
    })
}
