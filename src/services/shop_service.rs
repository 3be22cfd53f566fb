use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, ModelTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, SqlErr, TransactionTrait,
};
use sea_orm::sea_query::LockType;
use uuid::Uuid;

use crate::{
    clients::{geocode::AddressQuery, mail::OutgoingMail},
    dto::shops::{
        ActivateShopRequest, CompanyInfo, ContactShopRequest, PostcodeShops, RegisterShopRequest,
        ShopDetail, ShopDirectory, ShopRegistered,
    },
    entity::{
        postcodes::{Column as PostcodeCol, Entity as Postcodes, Model as PostcodeModel},
        shops::{ActiveModel as ShopActive, Column as ShopCol, Entity as Shops, Model as ShopModel},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult, FieldErrors},
    middleware::auth::ROLE_SHOP,
    models::{Postcode, Shop},
    response::{ApiResponse, Meta},
    services::{
        auth_service::{MIN_PASSWORD_LEN, decode_activation_token, hash_password, issue_activation_token},
        order_service::looks_like_email,
    },
    state::AppState,
};

/// Active postcodes with their active shops, ordered by postcode.
pub async fn list_shops(state: &AppState) -> AppResult<ApiResponse<ShopDirectory>> {
    let rows = Postcodes::find()
        .filter(PostcodeCol::Active.eq(true))
        .find_with_related(Shops)
        .filter(ShopCol::Active.eq(true))
        .order_by_asc(ShopCol::Name)
        .all(&state.orm)
        .await?;

    // find_with_related orders by the postcode id first.
    let mut items: Vec<PostcodeShops> = rows
        .into_iter()
        .filter(|(_, shops)| !shops.is_empty())
        .map(|(postcode, shops)| {
            let postcode = postcode_from_entity(postcode);
            PostcodeShops {
                shops: shops
                    .into_iter()
                    .map(|shop| shop_from_entity(shop, Some(postcode.clone())))
                    .collect(),
                postcode,
            }
        })
        .collect();
    items.sort_by(|a, b| a.postcode.postcode.cmp(&b.postcode.postcode));

    Ok(ApiResponse::success(
        "OK",
        ShopDirectory { items },
        Some(Meta::empty()),
    ))
}

pub async fn get_shop(state: &AppState, id: i32) -> AppResult<ApiResponse<ShopDetail>> {
    let (shop, postcode) = Shops::find_by_id(id)
        .filter(ShopCol::Active.eq(true))
        .find_also_related(Postcodes)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let shop = shop_from_entity(shop, postcode.map(postcode_from_entity));
    let detail = ShopDetail {
        slug: slugify(&format!("{} {}", shop.name, shop.id)),
        map_query: map_query(&shop)?,
        shop,
    };
    Ok(ApiResponse::success("OK", detail, Some(Meta::empty())))
}

/// Forward a customer's message to the shop's contact address.
pub async fn contact_shop(
    state: &AppState,
    id: i32,
    payload: ContactShopRequest,
) -> AppResult<ApiResponse<()>> {
    let email = payload.email.trim().to_lowercase();
    let subject = payload.subject.trim();
    let message = payload.message.trim();

    let mut errors = FieldErrors::new();
    errors.check_text("email", &email, 254);
    if !email.is_empty() && !looks_like_email(&email) {
        errors.add("email", "Enter a valid email address");
    }
    errors.check_text("subject", subject, 200);
    errors.check_text("message", message, 5000);
    errors.into_result()?;

    let shop = Shops::find_by_id(id)
        .filter(ShopCol::Active.eq(true))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    state
        .mailer
        .send(OutgoingMail {
            from: state.config.mail_from.clone(),
            to: vec![shop.email],
            reply_to: Some(email.clone()),
            subject: format!("[Foodbee] {subject}"),
            text: format!("Message from {email}:\n\n{message}"),
            html: None,
        })
        .await?;

    tracing::info!(shop_id = id, "contact message forwarded");
    Ok(ApiResponse::success("Message sent", (), Some(Meta::empty())))
}

/// Create an inactive shop owner and shop, then mail the activation link.
///
/// The mail goes out before the transaction commits, so a mailer failure
/// leaves no half-registered shop behind.
pub async fn register_shop(
    state: &AppState,
    payload: RegisterShopRequest,
) -> AppResult<ApiResponse<ShopRegistered>> {
    let payload = normalize_registration(payload);
    let mut errors = validate_registration(&payload);

    let txn = state.orm.begin().await?;

    let postcode = Postcodes::find()
        .filter(PostcodeCol::Postcode.eq(payload.postcode.as_str()))
        .one(&txn)
        .await?;
    if postcode.is_none() && errors.get("postcode").is_none() {
        errors.add("postcode", "Unknown postcode");
    }
    if Users::find()
        .filter(UserCol::Email.eq(payload.email.as_str()))
        .one(&txn)
        .await?
        .is_some()
    {
        errors.add("email", duplicate_message("email"));
    }
    if Shops::find()
        .filter(ShopCol::Phone.eq(payload.phone.as_str()))
        .one(&txn)
        .await?
        .is_some()
    {
        errors.add("phone", duplicate_message("phone"));
    }
    if Shops::find()
        .filter(ShopCol::CvrNumber.eq(payload.cvr_number.as_str()))
        .one(&txn)
        .await?
        .is_some()
    {
        errors.add("cvr_number", duplicate_message("cvr_number"));
    }
    errors.into_result()?;
    let postcode = postcode.ok_or_else(|| AppError::BadRequest("Unknown postcode".into()))?;

    let now = Utc::now();
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(payload.email.clone()),
        password_hash: Set(None),
        role: Set(ROLE_SHOP.to_string()),
        is_active: Set(false),
        created_at: Set(now.into()),
    }
    .insert(&txn)
    .await
    .map_err(duplicate_as_field_error)?;

    let shop = ShopActive {
        user_id: Set(user.id),
        name: Set(payload.name),
        address: Set(payload.address),
        postcode_id: Set(Some(postcode.id)),
        homepage: Set(payload.homepage),
        email: Set(payload.email.clone()),
        phone: Set(payload.phone),
        cvr_number: Set(Some(payload.cvr_number)),
        active: Set(false),
        order_pickup: Set(true),
        order_delivery: Set(false),
        latitude: Set(None),
        longitude: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(duplicate_as_field_error)?;

    let token = issue_activation_token(&state.config.jwt_secret, user.id)?;
    state
        .mailer
        .send(activation_mail(
            &state.config.mail_from,
            &state.config.site_domain,
            &user.email,
            &shop.name,
            &token,
        ))
        .await?;

    txn.commit().await?;

    tracing::info!(shop_id = shop.id, user_id = %user.id, "shop registered");
    Ok(ApiResponse::success(
        "Check your email to activate the shop",
        ShopRegistered {
            shop_id: shop.id,
            email: user.email,
        },
        Some(Meta::empty()),
    ))
}

/// Set the owner's password and make user and shop live.
pub async fn activate_shop(
    state: &AppState,
    payload: ActivateShopRequest,
) -> AppResult<ApiResponse<Shop>> {
    let user_id = decode_activation_token(&state.config.jwt_secret, payload.token.trim())?;
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        let mut errors = FieldErrors::new();
        errors.add(
            "password",
            format!("At least {MIN_PASSWORD_LEN} characters"),
        );
        return Err(AppError::Validation(errors));
    }

    let txn = state.orm.begin().await?;

    let user = Users::find_by_id(user_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::BadRequest("Activation link is invalid or has expired".into()))?;
    if user.is_active {
        return Err(AppError::Conflict("Account is already active".into()));
    }
    let shop = user
        .find_related(Shops)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut user: UserActive = user.into();
    user.password_hash = Set(Some(hash_password(&payload.password)?));
    user.is_active = Set(true);
    user.update(&txn).await?;

    let mut active: ShopActive = shop.into();
    active.active = Set(true);
    active.updated_at = Set(Utc::now().into());
    let mut shop = active.update(&txn).await?;

    txn.commit().await?;
    tracing::info!(shop_id = shop.id, user_id = %user_id, "shop activated");

    let postcode = match shop.postcode_id {
        Some(_) => shop.find_related(Postcodes).one(&state.orm).await?,
        None => None,
    };
    if shop.latitude.is_none() || shop.longitude.is_none() {
        shop = locate_shop(state, shop, postcode.as_ref()).await;
    }

    Ok(ApiResponse::success(
        "Shop activated",
        shop_from_entity(shop, postcode.map(postcode_from_entity)),
        Some(Meta::empty()),
    ))
}

/// Store coordinates for `shop`. Failures are logged and leave it unplaced.
async fn locate_shop(
    state: &AppState,
    shop: ShopModel,
    postcode: Option<&PostcodeModel>,
) -> ShopModel {
    let query = AddressQuery {
        street: shop.address.clone(),
        city: postcode.map(|p| p.city.clone()).unwrap_or_default(),
        postcode: postcode.map(|p| p.postcode.clone()).unwrap_or_default(),
    };

    let coordinates = match state.geocoder.locate(&query).await {
        Ok(Some(coordinates)) => coordinates,
        Ok(None) => {
            tracing::warn!(shop_id = shop.id, address = %query.street, "address not found by geocoder");
            return shop;
        }
        Err(err) => {
            tracing::warn!(shop_id = shop.id, error = %err, "geocoding failed");
            return shop;
        }
    };

    let mut active: ShopActive = shop.clone().into();
    active.latitude = Set(Some(coordinates.latitude));
    active.longitude = Set(Some(coordinates.longitude));
    match active.update(&state.orm).await {
        Ok(updated) => updated,
        Err(err) => {
            tracing::warn!(shop_id = shop.id, error = %err, "could not store shop location");
            shop
        }
    }
}

pub async fn cvr_lookup(state: &AppState, cvr: &str) -> AppResult<ApiResponse<CompanyInfo>> {
    let cvr = cvr.trim();
    if !is_cvr_number(cvr) {
        return Err(AppError::BadRequest("CVR number must be 8 digits".into()));
    }
    let company = state.cvr.lookup(cvr).await?.ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("OK", company, Some(Meta::empty())))
}

fn normalize_registration(payload: RegisterShopRequest) -> RegisterShopRequest {
    RegisterShopRequest {
        name: payload.name.trim().to_string(),
        address: payload.address.trim().to_string(),
        postcode: payload.postcode.trim().to_string(),
        homepage: payload.homepage.trim().to_string(),
        email: payload.email.trim().to_lowercase(),
        phone: payload.phone.split_whitespace().collect(),
        cvr_number: payload.cvr_number.trim().to_string(),
    }
}

/// Checks that need no database.
fn validate_registration(payload: &RegisterShopRequest) -> FieldErrors {
    let mut errors = FieldErrors::new();
    errors.check_text("name", &payload.name, 100);
    errors.check_text("address", &payload.address, 100);
    errors.check_text("email", &payload.email, 254);
    if !payload.email.is_empty() && !looks_like_email(&payload.email) {
        errors.add("email", "Enter a valid email address");
    }
    errors.check_text("phone", &payload.phone, 17);
    if payload.postcode.len() != 4 || !payload.postcode.chars().all(|c| c.is_ascii_digit()) {
        errors.add("postcode", "Enter a four digit postcode");
    }
    if !payload.homepage.is_empty()
        && !(payload.homepage.starts_with("http://") || payload.homepage.starts_with("https://"))
    {
        errors.add("homepage", "Enter a valid URL");
    }
    if !is_cvr_number(&payload.cvr_number) {
        errors.add("cvr_number", "CVR number must be 8 digits");
    }
    errors
}

fn duplicate_message(field: &str) -> &'static str {
    match field {
        "phone" => "A shop with this phone number already exists",
        "cvr_number" => "A shop with this CVR number already exists",
        _ => "A user with this email already exists",
    }
}

/// Column behind a unique-constraint message such as
/// `duplicate key value violates unique constraint "shops_phone_key"`.
fn unique_field(message: &str) -> &'static str {
    if message.contains("cvr_number") {
        "cvr_number"
    } else if message.contains("phone") {
        "phone"
    } else {
        "email"
    }
}

/// A registration that lost a race to a concurrent one hits the unique
/// indexes instead of the checks above; report it the same way.
fn duplicate_as_field_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(message)) => {
            let field = unique_field(&message);
            let mut errors = FieldErrors::new();
            errors.add(field, duplicate_message(field));
            AppError::Validation(errors)
        }
        _ => err.into(),
    }
}

pub fn is_cvr_number(value: &str) -> bool {
    value.len() == 8 && value.chars().all(|c| c.is_ascii_digit())
}

fn activation_mail(from: &str, domain: &str, to: &str, shop: &str, token: &str) -> OutgoingMail {
    let link = format!("https://{domain}/activate/{token}");
    OutgoingMail {
        from: from.to_string(),
        to: vec![to.to_string()],
        reply_to: None,
        subject: "Activate your shop on Foodbee".to_string(),
        text: format!(
            "Welcome to Foodbee, {shop}!\n\nOpen the link below to choose a password and activate your shop:\n{link}\n\nThe link is valid for 3 days."
        ),
        html: Some(format!(
            "<p>Welcome to Foodbee, {shop}!</p><p><a href=\"{link}\">Activate your shop</a></p><p>The link is valid for 3 days.</p>"
        )),
    }
}

/// Lowercase ASCII words joined by `-`. Danish letters are transliterated.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    for c in value.to_lowercase().chars() {
        match c {
            'æ' => slug.push_str("ae"),
            'ø' => slug.push_str("oe"),
            'å' => slug.push_str("aa"),
            c if c.is_ascii_alphanumeric() => slug.push(c),
            _ => {
                if !slug.is_empty() && !slug.ends_with('-') {
                    slug.push('-');
                }
            }
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// `query=<name> <address> <postcode> <city>`, form encoded.
fn map_query(shop: &Shop) -> AppResult<String> {
    let mut text = format!("{} {}", shop.name, shop.address);
    if let Some(postcode) = &shop.postcode {
        text = format!("{text} {} {}", postcode.postcode, postcode.city);
    }
    serde_urlencoded::to_string(&[("query", text.as_str())]).map_err(|err| AppError::Internal(err.into()))
}

fn postcode_from_entity(model: PostcodeModel) -> Postcode {
    Postcode {
        id: model.id,
        postcode: model.postcode,
        city: model.city,
    }
}

fn shop_from_entity(model: ShopModel, postcode: Option<Postcode>) -> Shop {
    Shop {
        id: model.id,
        name: model.name,
        address: model.address,
        postcode,
        homepage: model.homepage,
        email: model.email,
        phone: model.phone,
        cvr_number: model.cvr_number,
        active: model.active,
        order_pickup: model.order_pickup,
        order_delivery: model.order_delivery,
        latitude: model.latitude,
        longitude: model.longitude,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> RegisterShopRequest {
        RegisterShopRequest {
            name: "Bageriet".into(),
            address: "Åboulevarden 5".into(),
            postcode: "8000".into(),
            homepage: "https://bageriet.dk".into(),
            email: " Info@Bageriet.dk".into(),
            phone: "12 34 56 78".into(),
            cvr_number: "12345678".into(),
        }
    }

    #[test]
    fn slug_joins_words() {
        assert_eq!(slugify("Bageriet 4"), "bageriet-4");
        assert_eq!(slugify("  Søren's Grønt & Frugt  12"), "soeren-s-groent-frugt-12");
        assert_eq!(slugify("Café Ål"), "caf-aal");
    }

    #[test]
    fn map_query_is_form_encoded() {
        let shop = Shop {
            id: 1,
            name: "Bageriet".into(),
            address: "Vestergade 1".into(),
            postcode: Some(Postcode {
                id: 1,
                postcode: "8000".into(),
                city: "Aarhus C".into(),
            }),
            homepage: String::new(),
            email: "info@bageriet.dk".into(),
            phone: "12345678".into(),
            cvr_number: None,
            active: true,
            order_pickup: true,
            order_delivery: false,
            latitude: None,
            longitude: None,
        };
        assert_eq!(
            map_query(&shop).unwrap(),
            "query=Bageriet+Vestergade+1+8000+Aarhus+C"
        );
    }

    #[test]
    fn registration_is_normalised_and_valid() {
        let payload = normalize_registration(registration());
        assert_eq!(payload.email, "info@bageriet.dk");
        assert_eq!(payload.phone, "12345678");
        assert!(validate_registration(&payload).is_empty());
    }

    #[test]
    fn registration_flags_bad_fields() {
        let payload = normalize_registration(RegisterShopRequest {
            homepage: "bageriet.dk".into(),
            cvr_number: "1234".into(),
            postcode: "DK-8000".into(),
            ..registration()
        });
        let errors = validate_registration(&payload);
        assert!(errors.get("homepage").is_some());
        assert!(errors.get("cvr_number").is_some());
        assert!(errors.get("postcode").is_some());
        assert!(errors.get("name").is_none());
    }

    #[test]
    fn activation_mail_links_to_site() {
        let mail = activation_mail("noreply@foodbee.dk", "foodbee.dk", "info@bageriet.dk", "Bageriet", "abc");
        assert_eq!(mail.to, vec!["info@bageriet.dk".to_string()]);
        assert!(mail.text.contains("https://foodbee.dk/activate/abc"));
    }

    #[test]
    fn unique_violations_name_the_field() {
        let message = |name: &str| format!("duplicate key value violates unique constraint \"{name}\"");
        assert_eq!(unique_field(&message("shops_phone_key")), "phone");
        assert_eq!(unique_field(&message("shops_cvr_number_key")), "cvr_number");
        assert_eq!(unique_field(&message("users_email_key")), "email");
        assert_eq!(duplicate_message("phone"), "A shop with this phone number already exists");
    }

    #[test]
    fn cvr_numbers_are_eight_digits() {
        assert!(is_cvr_number("12345678"));
        assert!(!is_cvr_number("1234567"));
        assert!(!is_cvr_number("1234567a"));
    }
}
