use std::pin::Pin;

use actix_web::body::MessageBody;
use actix_web::http::StatusCode;
use actix_web::http::header;
use actix_web::{App, test};
use serde_json::{Value, json};

use trimpro_fsm::configure_app;

mod common;

macro_rules! app {
    ($test_db:expr) => {{
        let repo = $test_db.repo();
        common::seed_admin(&repo);
        test::init_service(App::new().configure(configure_app(repo, common::server_config())))
            .await
    }};
}

macro_rules! login {
    ($app:expr) => {
        login!($app, common::ADMIN_EMAIL, common::ADMIN_PASSWORD)
    };
    ($app:expr, $email:expr, $password:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": $email, "password": $password }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&$app, req).await;
        format!("Bearer {}", body["accessToken"].as_str().expect("access token"))
    }};
}

macro_rules! send {
    ($app:expr, $req:expr) => {{
        let resp = test::call_service(&$app, $req.to_request()).await;
        let status = resp.status();
        let body: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap_or(Value::Null);
        (status, body)
    }};
}

fn get(uri: &str, token: &str) -> test::TestRequest {
    test::TestRequest::get()
        .uri(uri)
        .insert_header((header::AUTHORIZATION, token.to_string()))
}

fn post(uri: &str, token: &str, body: Value) -> test::TestRequest {
    test::TestRequest::post()
        .uri(uri)
        .insert_header((header::AUTHORIZATION, token.to_string()))
        .set_json(body)
}

fn put(uri: &str, token: &str, body: Value) -> test::TestRequest {
    test::TestRequest::put()
        .uri(uri)
        .insert_header((header::AUTHORIZATION, token.to_string()))
        .set_json(body)
}

fn delete(uri: &str, token: &str) -> test::TestRequest {
    test::TestRequest::delete()
        .uri(uri)
        .insert_header((header::AUTHORIZATION, token.to_string()))
}

async fn next_frame<B>(mut body: Pin<&mut B>) -> String
where
    B: MessageBody,
    B::Error: std::fmt::Debug,
{
    let chunk = std::future::poll_fn(|cx| body.as_mut().poll_next(cx))
        .await
        .expect("stream ended")
        .expect("stream failed");
    String::from_utf8(chunk.to_vec()).unwrap()
}

fn descriptions(lines: &Value) -> Vec<String> {
    lines
        .as_array()
        .unwrap()
        .iter()
        .map(|line| line["description"].as_str().unwrap().to_string())
        .collect()
}

#[actix_web::test]
async fn test_login_rejects_bad_password() {
    let test_db = common::TestDb::new("test_login_rejects_bad_password.db");
    let app = app!(test_db);

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": common::ADMIN_EMAIL, "password": "wrong password" }))
    );

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");
}

#[actix_web::test]
async fn test_permissions_follow_role() {
    let test_db = common::TestDb::new("test_permissions_follow_role.db");
    let app = app!(test_db);
    let token = login!(app);

    let (status, body) = send!(app, get("/api/auth/permissions", &token));

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "ADMIN");
    let permissions = body["permissions"].as_array().unwrap();
    assert!(permissions.iter().any(|p| p == "invoices:edit"));
}

#[actix_web::test]
async fn test_requests_without_token_are_unauthorized() {
    let test_db = common::TestDb::new("test_requests_without_token_are_unauthorized.db");
    let app = app!(test_db);

    let (status, _) = send!(app, test::TestRequest::get().uri("/api/clients"));
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send!(app, get("/api/clients", "Bearer not-a-jwt"));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_bootstrap_is_refused_once_an_admin_exists() {
    let test_db = common::TestDb::new("test_bootstrap_is_refused_once_an_admin_exists.db");
    let app = app!(test_db);

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/bootstrap/admin")
            .set_json(json!({ "email": "second@trimpro.test", "password": "long enough" }))
    );

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Admin user already exists");
}

#[actix_web::test]
async fn test_invited_user_sets_password_before_login() {
    let test_db = common::TestDb::new("test_invited_user_sets_password_before_login.db");
    let app = app!(test_db);
    let token = login!(app);

    let (status, invited) = send!(
        app,
        post(
            "/api/users/invite",
            &token,
            json!({
                "email": "crew@trimpro.test",
                "firstName": "Casey",
                "lastName": "Crew",
                "role": "FIELD"
            })
        )
    );
    assert_eq!(status, StatusCode::CREATED);
    let temporary = invited["temporaryPassword"].as_str().unwrap().to_string();
    assert_eq!(temporary.len(), 12);

    let (status, _) = send!(
        app,
        post(
            "/api/users/invite",
            &token,
            json!({
                "email": "CREW@trimpro.test",
                "firstName": "Casey",
                "lastName": "Again",
                "role": "FIELD"
            })
        )
    );
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": "crew@trimpro.test", "password": temporary }))
    );
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["requiresPasswordChange"], true);
    let user_id = body["userId"].as_i64().unwrap();

    let (status, _) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/auth/set-password")
            .set_json(json!({
                "userId": user_id,
                "temporaryPassword": temporary,
                "newPassword": "measure twice"
            }))
    );
    assert_eq!(status, StatusCode::OK);

    let field_token = login!(app, "crew@trimpro.test", "measure twice");
    let (status, _) = send!(app, get("/api/invoices", &field_token));
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_refresh_rotates_tokens() {
    let test_db = common::TestDb::new("test_refresh_rotates_tokens.db");
    let app = app!(test_db);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": common::ADMIN_EMAIL, "password": common::ADMIN_PASSWORD }))
        .to_request();
    let session: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(session["user"]["tenantName"], "Default Tenant");
    let refresh_token = session["refreshToken"].as_str().unwrap().to_string();

    let (status, rotated) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/auth/refresh")
            .set_json(json!({ "refreshToken": refresh_token }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_ne!(rotated["refreshToken"], refresh_token.as_str());

    let (status, _) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/auth/refresh")
            .set_json(json!({ "refreshToken": refresh_token }))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_clients_crud_and_export() {
    let test_db = common::TestDb::new("test_clients_crud_and_export.db");
    let app = app!(test_db);
    let token = login!(app);

    let (status, created) = send!(
        app,
        post(
            "/api/clients",
            &token,
            json!({
                "name": "Acme Homes",
                "companyName": "Acme",
                "email": "Office@Acme.test",
                "phone": "(555) 123-4567"
            })
        )
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["client"]["email"], "office@acme.test");
    let id = created["client"]["id"].as_i64().unwrap();

    send!(app, post("/api/clients", &token, json!({ "name": "Birch Builders" })));

    let (status, listed) = send!(app, get("/api/clients?search=acme&limit=10", &token));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["clients"].as_array().unwrap().len(), 1);
    assert_eq!(listed["pagination"]["total"], 1);
    assert_eq!(listed["pagination"]["limit"], 10);

    let (status, updated) = send!(
        app,
        put(
            &format!("/api/clients/{id}"),
            &token,
            json!({ "name": "Acme Homes LLC", "isActive": false })
        )
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["client"]["isActive"], false);

    let resp = test::call_service(&app, get("/api/clients/export", &token).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("attachment; filename=\"clients-export-")
    );
    let csv = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(csv.starts_with("Name,Company,Email,Phone,Address,Notes,Active,Created"));
    assert!(csv.contains("Acme Homes LLC"));

    let (status, _) = send!(
        app,
        test::TestRequest::delete()
            .uri(&format!("/api/clients/{id}"))
            .insert_header((header::AUTHORIZATION, token.clone()))
    );
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send!(app, get(&format!("/api/clients/{id}"), &token));
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_lead_conversion_reuses_matching_client() {
    let test_db = common::TestDb::new("test_lead_conversion_reuses_matching_client.db");
    let app = app!(test_db);
    let token = login!(app);

    let (_, client) = send!(
        app,
        post(
            "/api/clients",
            &token,
            json!({ "name": "Pat Doe", "email": "pat@example.com" })
        )
    );
    let client_id = client["client"]["id"].as_i64().unwrap();

    let (status, lead) = send!(
        app,
        post(
            "/api/leads",
            &token,
            json!({
                "firstName": "Pat",
                "lastName": "Doe",
                "email": "PAT@example.com",
                "source": "REFERRAL",
                "value": 250000
            })
        )
    );
    assert_eq!(status, StatusCode::CREATED);
    let lead_id = lead["lead"]["id"].as_i64().unwrap();

    let uri = format!("/api/leads/{lead_id}/convert");
    let (status, converted) = send!(app, post(&uri, &token, json!({})));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(converted["clientCreated"], false);
    assert_eq!(converted["client"]["id"], client_id);
    assert_eq!(converted["lead"]["status"], "CONVERTED");

    let (status, _) = send!(app, post(&uri, &token, json!({})));
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, activities) = send!(
        app,
        get(&format!("/api/activities?clientId={client_id}"), &token)
    );
    assert!(!activities["activities"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn test_bundles_flatten_and_reject_cycles() {
    let test_db = common::TestDb::new("test_bundles_flatten_and_reject_cycles.db");
    let app = app!(test_db);
    let token = login!(app);

    let (_, molding) = send!(
        app,
        post(
            "/api/items",
            &token,
            json!({ "name": "Crown molding", "type": "MATERIAL", "unit": "ft", "unitPrice": 1000 })
        )
    );
    let (_, labor) = send!(
        app,
        post(
            "/api/items",
            &token,
            json!({ "name": "Install labor", "type": "LABOR", "unit": "hr", "unitPrice": 250 })
        )
    );
    let molding_id = molding["item"]["id"].as_i64().unwrap();
    let labor_id = labor["item"]["id"].as_i64().unwrap();

    let (status, inner) = send!(
        app,
        post(
            "/api/bundles",
            &token,
            json!({
                "name": "Molding kit",
                "components": [
                    { "componentType": "ITEM", "componentItemId": molding_id, "quantity": 2 }
                ]
            })
        )
    );
    assert_eq!(status, StatusCode::CREATED);
    let inner_id = inner["bundle"]["id"].as_i64().unwrap();

    let (_, outer) = send!(
        app,
        post(
            "/api/bundles",
            &token,
            json!({
                "name": "Room package",
                "components": [
                    { "componentType": "ITEM", "componentItemId": labor_id, "quantity": 3 },
                    { "componentType": "BUNDLE", "componentBundleId": inner_id, "quantity": 2 }
                ]
            })
        )
    );
    let outer_id = outer["bundle"]["id"].as_i64().unwrap();

    let (status, flat) = send!(app, get(&format!("/api/bundles/{outer_id}/flatten"), &token));
    assert_eq!(status, StatusCode::OK);
    let lines = flat["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["itemId"], labor_id);
    assert_eq!(lines[0]["quantity"], 3.0);
    assert_eq!(lines[1]["itemId"], molding_id);
    assert_eq!(lines[1]["quantity"], 4.0);

    let (status, body) = send!(
        app,
        put(
            &format!("/api/bundles/{inner_id}"),
            &token,
            json!({
                "name": "Molding kit",
                "components": [
                    { "componentType": "BUNDLE", "componentBundleId": outer_id, "quantity": 1 }
                ]
            })
        )
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Circular bundle reference detected");

    let (_, client) = send!(app, post("/api/clients", &token, json!({ "name": "Reed" })));
    let (_, estimate) = send!(
        app,
        post(
            "/api/estimates",
            &token,
            json!({
                "clientId": client["client"]["id"],
                "title": "Living room",
                "lineItems": [{ "description": "Site visit", "unitPrice": 0 }]
            })
        )
    );
    let estimate_id = estimate["estimate"]["id"].as_i64().unwrap();

    let (status, group) = send!(
        app,
        post(
            &format!("/api/estimates/{estimate_id}/bundles"),
            &token,
            json!({ "bundleId": outer_id })
        )
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(group["group"]["name"], "Room package");
    let group_id = group["group"]["id"].as_i64().unwrap();

    let (_, detail) = send!(app, get(&format!("/api/estimates/{estimate_id}"), &token));
    assert_eq!(detail["estimate"]["subtotal"], 4_750);
    assert_eq!(detail["estimate"]["lineItems"].as_array().unwrap().len(), 3);

    let (status, _) = send!(
        app,
        test::TestRequest::delete()
            .uri(&format!("/api/estimates/{estimate_id}/groups/{group_id}"))
            .insert_header((header::AUTHORIZATION, token.clone()))
    );
    assert_eq!(status, StatusCode::OK);
    let (_, detail) = send!(app, get(&format!("/api/estimates/{estimate_id}"), &token));
    assert_eq!(detail["estimate"]["subtotal"], 0);
    assert_eq!(detail["estimate"]["lineItems"].as_array().unwrap().len(), 1);
    assert!(detail["estimate"]["groups"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn test_estimate_converts_to_job_once() {
    let test_db = common::TestDb::new("test_estimate_converts_to_job_once.db");
    let app = app!(test_db);
    let token = login!(app);

    let (_, client) = send!(app, post("/api/clients", &token, json!({ "name": "Quinn" })));
    let (status, estimate) = send!(
        app,
        post(
            "/api/estimates",
            &token,
            json!({
                "clientId": client["client"]["id"],
                "title": "Wainscoting",
                "taxRate": 0.1,
                "lineItems": [
                    { "description": "Panels", "quantity": 10, "unitPrice": 1500 },
                    { "description": "Labor", "quantity": 2, "unitPrice": 5000 }
                ]
            })
        )
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(estimate["estimate"]["estimateNumber"], "EST-000001");
    assert_eq!(estimate["estimate"]["subtotal"], 25_000);
    assert_eq!(estimate["estimate"]["tax"], 2_500);
    assert_eq!(estimate["estimate"]["total"], 27_500);
    let id = estimate["estimate"]["id"].as_i64().unwrap();

    let uri = format!("/api/estimates/{id}/convert-to-job");
    let (status, first) = send!(app, post(&uri, &token, json!({})));
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["job"]["status"], "QUOTE");
    assert_eq!(first["job"]["priority"], 3);
    assert_eq!(first["job"]["estimateAmount"], 27_500);

    let (status, second) = send!(app, post(&uri, &token, json!({})));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["job"]["id"], first["job"]["id"]);

    let (_, detail) = send!(app, get(&format!("/api/estimates/{id}"), &token));
    assert_eq!(detail["estimate"]["status"], "CONVERTED");
}

#[actix_web::test]
async fn test_invoice_paid_through_webhook() {
    let test_db = common::TestDb::new("test_invoice_paid_through_webhook.db");
    let app = app!(test_db);
    let token = login!(app);

    let (_, client) = send!(app, post("/api/clients", &token, json!({ "name": "Rivera" })));
    let (_, estimate) = send!(
        app,
        post(
            "/api/estimates",
            &token,
            json!({
                "clientId": client["client"]["id"],
                "title": "Baseboards",
                "taxRate": 0.1,
                "lineItems": [
                    { "description": "Baseboard", "quantity": 10, "unitPrice": 1500 },
                    { "description": "Shop time", "quantity": 1, "unitPrice": 0,
                      "isVisibleToClient": false }
                ]
            })
        )
    );
    let estimate_id = estimate["estimate"]["id"].as_i64().unwrap();

    let (status, invoice) = send!(
        app,
        post(
            &format!("/api/estimates/{estimate_id}/convert-to-invoice"),
            &token,
            json!({ "billingMode": "FULL" })
        )
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(invoice["invoice"]["status"], "DRAFT");
    assert_eq!(invoice["invoice"]["total"], 16_500);
    assert_eq!(invoice["invoice"]["balance"], 16_500);
    let invoice_id = invoice["invoice"]["id"].as_i64().unwrap();
    let public_id = invoice["invoice"]["publicId"].as_str().unwrap().to_string();

    let (status, public) = send!(
        app,
        test::TestRequest::get().uri(&format!("/api/public/invoices/{public_id}"))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(public["invoice"]["lineItems"].as_array().unwrap().len(), 1);

    let payload = json!({
        "xResult": "S",
        "xInvoice": public_id,
        "xAmount": "165.00",
        "xRefNum": "txn-1001"
    });

    let (status, _) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/webhooks/payments")
            .insert_header(("X-Webhook-Secret", "wrong"))
            .set_json(payload.clone())
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    for _ in 0..2 {
        let (status, ack) = send!(
            app,
            test::TestRequest::post()
                .uri("/api/webhooks/payments")
                .insert_header(("X-Webhook-Secret", "hook-secret"))
                .set_json(payload.clone())
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ack["ok"], true);
    }

    let (_, paid) = send!(app, get(&format!("/api/invoices/{invoice_id}"), &token));
    assert_eq!(paid["invoice"]["status"], "PAID");
    assert_eq!(paid["invoice"]["balance"], 0);
    assert_eq!(paid["invoice"]["payments"].as_array().unwrap().len(), 1);

    let (_, jobs) = send!(app, get("/api/jobs", &token));
    assert_eq!(jobs["pagination"]["total"], 1);

    let (_, feed) = send!(app, get("/api/notifications?unreadOnly=true", &token));
    assert!(feed["unreadCount"].as_u64().unwrap() >= 1);
    let notifications = feed["notifications"].as_array().unwrap();
    assert!(notifications.iter().any(|n| n["type"] == "INVOICE_PAID"));

    let (status, read) = send!(app, post("/api/notifications/read-all", &token, json!({})));
    assert_eq!(status, StatusCode::OK);
    assert!(read["updated"].as_u64().unwrap() >= 1);
}

#[actix_web::test]
async fn test_manual_payment_marks_invoice_partial() {
    let test_db = common::TestDb::new("test_manual_payment_marks_invoice_partial.db");
    let app = app!(test_db);
    let token = login!(app);

    let (_, client) = send!(app, post("/api/clients", &token, json!({ "name": "Stone" })));
    let (status, invoice) = send!(
        app,
        post(
            "/api/invoices",
            &token,
            json!({
                "clientId": client["client"]["id"],
                "title": "Trim repair",
                "lineItems": [{ "description": "Repair", "unitPrice": 10000 }]
            })
        )
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(invoice["invoice"]["invoiceNumber"], "INV-000001");
    let id = invoice["invoice"]["id"].as_i64().unwrap();

    let (status, paid) = send!(
        app,
        post(
            &format!("/api/invoices/{id}/payments"),
            &token,
            json!({ "amount": 4000, "method": "CHECK", "reference": "1042" })
        )
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(paid["invoice"]["status"], "PARTIAL");
    assert_eq!(paid["invoice"]["balance"], 6_000);
    assert_eq!(paid["payment"]["status"], "COMPLETED");
}

#[actix_web::test]
async fn test_purchase_order_approval_flow() {
    let test_db = common::TestDb::new("test_purchase_order_approval_flow.db");
    let app = app!(test_db);
    let token = login!(app);

    let (status, body) = send!(app, post("/api/purchase-orders", &token, json!({})));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Vendor"));

    let (status, created) = send!(
        app,
        post(
            "/api/purchase-orders",
            &token,
            json!({ "vendor": "Millwork Supply", "taxRate": 0.05 })
        )
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["purchaseOrder"]["poNumber"], "PO-000001");
    let id = created["purchaseOrder"]["id"].as_i64().unwrap();

    let (status, line) = send!(
        app,
        post(
            &format!("/api/purchase-orders/{id}/line-items"),
            &token,
            json!({ "description": "Oak stock", "quantity": 4, "unitPrice": 2500 })
        )
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(line["lineItem"]["total"], 10_000);

    let (_, detail) = send!(app, get(&format!("/api/purchase-orders/{id}"), &token));
    assert_eq!(detail["purchaseOrder"]["total"], 10_500);

    let approve = format!("/api/purchase-orders/{id}/approve");
    let (status, approved) = send!(app, post(&approve, &token, json!({})));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["purchaseOrder"]["status"], "APPROVED");

    let (status, body) = send!(app, post(&approve, &token, json!({})));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Purchase order is already APPROVED");

    let (status, received) = send!(
        app,
        post(&format!("/api/purchase-orders/{id}/receive"), &token, json!({}))
    );
    assert_eq!(status, StatusCode::OK);
    assert!(!received["purchaseOrder"]["receivedAt"].is_null());
}

#[actix_web::test]
async fn test_job_assignments_notify_new_crew() {
    let test_db = common::TestDb::new("test_job_assignments_notify_new_crew.db");
    let app = app!(test_db);
    let token = login!(app);

    let (_, invited) = send!(
        app,
        post(
            "/api/users/invite",
            &token,
            json!({
                "email": "field@trimpro.test",
                "firstName": "Frank",
                "lastName": "Field",
                "role": "FIELD"
            })
        )
    );
    let field_id = invited["user"]["id"].as_i64().unwrap();

    let (_, client) = send!(app, post("/api/clients", &token, json!({ "name": "Ueda" })));
    let (status, job) = send!(
        app,
        post(
            "/api/jobs",
            &token,
            json!({ "clientId": client["client"]["id"], "title": "Door casing", "priority": 9 })
        )
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(job["job"]["priority"], 5);
    let id = job["job"]["id"].as_i64().unwrap();

    let (status, assigned) = send!(
        app,
        put(
            &format!("/api/jobs/{id}/assignments"),
            &token,
            json!({ "userIds": [field_id] })
        )
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(assigned["job"]["assignees"][0]["id"], field_id);

    let (status, _) = send!(
        app,
        put(
            &format!("/api/jobs/{id}/assignments"),
            &token,
            json!({ "userIds": [9999] })
        )
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, completed) = send!(
        app,
        put(
            &format!("/api/jobs/{id}/status"),
            &token,
            json!({ "status": "COMPLETED" })
        )
    );
    assert_eq!(status, StatusCode::OK);
    assert!(!completed["job"]["completedAt"].is_null());
}

#[actix_web::test]
async fn test_items_import_from_csv() {
    let test_db = common::TestDb::new("test_items_import_from_csv.db");
    let app = app!(test_db);
    let token = login!(app);

    let boundary = "trimpro-boundary";
    let csv = "Name,SKU,Type,Description,Unit,Unit Cost,Unit Price,Taxable,Active\n\
               Casing,CS-1,MATERIAL,Pine casing,ft,1.10,2.50,Yes,Yes\n\
               ,NO-NAME,MATERIAL,,each,,1.00,No,Yes\n";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"csv\"; filename=\"items.csv\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {csv}\r\n\
         --{boundary}--\r\n"
    );

    let (status, summary) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/items/import")
            .insert_header((header::AUTHORIZATION, token.clone()))
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            ))
            .set_payload(body)
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["imported"], 1);
    assert_eq!(summary["skipped"], 1);

    let (_, items) = send!(app, get("/api/items?search=casing", &token));
    assert_eq!(items["items"][0]["unitPrice"], 250);
    assert_eq!(items["items"][0]["unitCost"], 110);
}

#[actix_web::test]
async fn test_unknown_document_kind_is_not_found() {
    let test_db = common::TestDb::new("test_unknown_document_kind_is_not_found.db");
    let app = app!(test_db);
    let token = login!(app);

    let (status, _) = send!(app, get("/api/vendors/1/line-items", &token));
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_notification_stream_greets_then_polls() {
    let test_db = common::TestDb::new("test_notification_stream_greets_then_polls.db");
    let app = app!(test_db);
    let token = login!(app);

    let resp = test::call_service(
        &app,
        get("/api/notifications/stream?since=0", &token).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/event-stream"
    );

    let body = resp.into_body();
    let mut body = std::pin::pin!(body);

    let hello = next_frame(body.as_mut()).await;
    assert!(hello.starts_with("event: hello\ndata: "));
    assert!(hello.ends_with("\n\n"));
    let data: Value = serde_json::from_str(
        hello
            .trim_end()
            .strip_prefix("event: hello\ndata: ")
            .unwrap(),
    )
    .unwrap();
    assert_eq!(data, json!({ "ok": true, "cursor": 0 }));

    let second = next_frame(body.as_mut()).await;
    assert!(second.starts_with("event: ping\n") || second.starts_with("event: notifications\n"));
}

#[actix_web::test]
async fn test_paid_invoice_is_locked() {
    let test_db = common::TestDb::new("test_paid_invoice_is_locked.db");
    let app = app!(test_db);
    let token = login!(app);

    let (_, client) = send!(app, post("/api/clients", &token, json!({ "name": "Hale" })));
    let (_, invoice) = send!(
        app,
        post(
            "/api/invoices",
            &token,
            json!({
                "clientId": client["client"]["id"],
                "title": "Porch trim",
                "lineItems": [{ "description": "Porch trim", "unitPrice": 8000 }]
            })
        )
    );
    let id = invoice["invoice"]["id"].as_i64().unwrap();

    let (status, paid) = send!(
        app,
        post(
            &format!("/api/invoices/{id}/payments"),
            &token,
            json!({ "amount": 8000, "method": "CHECK" })
        )
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(paid["invoice"]["status"], "PAID");

    let (status, body) = send!(
        app,
        put(
            &format!("/api/invoices/{id}"),
            &token,
            json!({ "clientId": client["client"]["id"], "title": "Porch trim (revised)" })
        )
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cannot edit paid invoice");

    let (status, body) = send!(
        app,
        post(
            &format!("/api/invoices/{id}/line-items"),
            &token,
            json!({ "description": "Extra", "unitPrice": 100 })
        )
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cannot edit paid invoice");

    let (_, stored) = send!(app, get(&format!("/api/invoices/{id}"), &token));
    assert_eq!(stored["invoice"]["title"], "Porch trim");
}

#[actix_web::test]
async fn test_line_positions_are_bounded_and_kept() {
    let test_db = common::TestDb::new("test_line_positions_are_bounded_and_kept.db");
    let app = app!(test_db);
    let token = login!(app);

    let (_, client) = send!(app, post("/api/clients", &token, json!({ "name": "Quinn" })));
    let (_, estimate) = send!(
        app,
        post(
            "/api/estimates",
            &token,
            json!({
                "clientId": client["client"]["id"],
                "title": "Hallway",
                "lineItems": [
                    { "description": "Casing", "unitPrice": 500 },
                    { "description": "Baseboard", "unitPrice": 700 }
                ]
            })
        )
    );
    let id = estimate["estimate"]["id"].as_i64().unwrap();

    let (status, body) = send!(
        app,
        post(
            &format!("/api/estimates/{id}/line-items"),
            &token,
            json!({ "description": "Overflow", "unitPrice": 1, "sortOrder": 2147483647 })
        )
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Sort order must be between"));

    let (_, lines) = send!(app, get(&format!("/api/estimates/{id}/line-items"), &token));
    let first_id = lines["lineItems"][0]["id"].as_i64().unwrap();
    assert_eq!(descriptions(&lines["lineItems"]), vec!["Casing", "Baseboard"]);

    let (status, updated) = send!(
        app,
        put(
            &format!("/api/estimates/{id}/line-items/{first_id}"),
            &token,
            json!({ "description": "Casing (oak)", "unitPrice": 900 })
        )
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["lineItem"]["sortOrder"], 0);

    let (_, lines) = send!(app, get(&format!("/api/estimates/{id}/line-items"), &token));
    assert_eq!(descriptions(&lines["lineItems"]), vec!["Casing (oak)", "Baseboard"]);
}

#[actix_web::test]
async fn test_bundle_groups_refresh_and_ungroup() {
    let test_db = common::TestDb::new("test_bundle_groups_refresh_and_ungroup.db");
    let app = app!(test_db);
    let token = login!(app);

    let (_, casing) = send!(
        app,
        post(
            "/api/items",
            &token,
            json!({ "name": "Casing", "type": "MATERIAL", "unit": "ft", "unitPrice": 300 })
        )
    );
    let casing_id = casing["item"]["id"].as_i64().unwrap();
    let (_, bundle) = send!(
        app,
        post(
            "/api/bundles",
            &token,
            json!({
                "name": "Window kit",
                "components": [
                    { "componentType": "ITEM", "componentItemId": casing_id, "quantity": 10 }
                ]
            })
        )
    );
    let bundle_id = bundle["bundle"]["id"].as_i64().unwrap();

    let (_, client) = send!(app, post("/api/clients", &token, json!({ "name": "Ruiz" })));
    let (_, estimate) = send!(
        app,
        post(
            "/api/estimates",
            &token,
            json!({
                "clientId": client["client"]["id"],
                "title": "Windows",
                "lineItems": [
                    { "description": "Demo", "unitPrice": 1000 },
                    { "description": "Cleanup", "unitPrice": 500, "sortOrder": 50 }
                ]
            })
        )
    );
    let id = estimate["estimate"]["id"].as_i64().unwrap();

    let (_, group) = send!(
        app,
        post(
            &format!("/api/estimates/{id}/bundles"),
            &token,
            json!({ "bundleId": bundle_id })
        )
    );
    let group_id = group["group"]["id"].as_i64().unwrap();

    let (status, _) = send!(
        app,
        put(
            &format!("/api/bundles/{bundle_id}"),
            &token,
            json!({
                "name": "Window kit v2",
                "components": [
                    { "componentType": "ITEM", "componentItemId": casing_id, "quantity": 12 }
                ]
            })
        )
    );
    assert_eq!(status, StatusCode::OK);

    let (status, refreshed) = send!(
        app,
        post(
            &format!("/api/estimates/{id}/groups/{group_id}/update-from-template"),
            &token,
            json!({})
        )
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refreshed["success"], true);
    assert_eq!(refreshed["group"]["name"], "Window kit v2");
    assert_eq!(refreshed["lineItems"][0]["quantity"], 12.0);

    let (_, detail) = send!(app, get(&format!("/api/estimates/{id}"), &token));
    assert_eq!(detail["estimate"]["subtotal"], 5_100);

    let (status, _) = send!(
        app,
        post(
            &format!("/api/estimates/{id}/groups/{group_id}/ungroup"),
            &token,
            json!({})
        )
    );
    assert_eq!(status, StatusCode::OK);

    let (_, lines) = send!(app, get(&format!("/api/estimates/{id}/line-items"), &token));
    assert!(lines["groups"].as_array().unwrap().is_empty());
    assert_eq!(lines["lineItems"].as_array().unwrap().len(), 3);
    assert!(lines["lineItems"][1]["groupId"].is_null());

    let (status, _) = send!(
        app,
        post(
            &format!("/api/estimates/{id}/groups/{group_id}/update-from-template"),
            &token,
            json!({})
        )
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_lead_converts_to_estimate() {
    let test_db = common::TestDb::new("test_lead_converts_to_estimate.db");
    let app = app!(test_db);
    let token = login!(app);

    let (_, lead) = send!(
        app,
        post(
            "/api/leads",
            &token,
            json!({ "firstName": "Nina", "lastName": "Cole", "company": "Cole Homes", "value": 45000 })
        )
    );
    let lead_id = lead["lead"]["id"].as_i64().unwrap();

    let (status, converted) = send!(
        app,
        post(
            &format!("/api/leads/{lead_id}/convert-to-estimate"),
            &token,
            json!({})
        )
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(converted["estimate"]["estimateNumber"], "EST-000001");
    assert_eq!(converted["estimate"]["status"], "DRAFT");
    assert_eq!(converted["estimate"]["total"], 45_000);
    let estimate_id = converted["estimate"]["id"].as_i64().unwrap();

    let (_, lines) = send!(
        app,
        get(&format!("/api/estimates/{estimate_id}/line-items"), &token)
    );
    assert_eq!(
        descriptions(&lines["lineItems"]),
        vec!["Requested work for Cole Homes"]
    );

    let (_, lead) = send!(app, get(&format!("/api/leads/{lead_id}"), &token));
    assert_eq!(lead["lead"]["status"], "ESTIMATE_SENT");

    let (status, _) = send!(
        app,
        post("/api/leads/9999/convert-to-estimate", &token, json!({}))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_dispatch_board_assigns_active_technicians() {
    let test_db = common::TestDb::new("test_dispatch_board_assigns_active_technicians.db");
    let app = app!(test_db);
    let token = login!(app);

    let (_, invited) = send!(
        app,
        post(
            "/api/users/invite",
            &token,
            json!({
                "email": "new.tech@trimpro.test",
                "firstName": "Nia",
                "lastName": "Tech",
                "role": "FIELD"
            })
        )
    );
    let invited_id = invited["user"]["id"].as_i64().unwrap();

    let (status, techs) = send!(app, get("/api/dispatch/techs", &token));
    assert_eq!(status, StatusCode::OK);
    let techs = techs["techs"].as_array().unwrap();
    assert_eq!(techs.len(), 1);
    assert_eq!(techs[0]["role"], "ADMIN");
    let admin_id = techs[0]["id"].as_i64().unwrap();

    let (_, client) = send!(app, post("/api/clients", &token, json!({ "name": "Ito" })));
    let (_, job) = send!(
        app,
        post(
            "/api/jobs",
            &token,
            json!({ "clientId": client["client"]["id"], "title": "Stair skirt", "status": "SCHEDULED" })
        )
    );
    let job_id = job["job"]["id"].as_i64().unwrap();

    let (status, board) = send!(app, get("/api/dispatch/jobs", &token));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(board["jobs"][0]["id"], job_id);

    let (status, body) = send!(
        app,
        post(
            "/api/dispatch/assign",
            &token,
            json!({ "jobId": job_id, "userId": invited_id })
        )
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User not found or inactive");

    let (status, assigned) = send!(
        app,
        post(
            "/api/dispatch/assign",
            &token,
            json!({
                "jobId": job_id,
                "userId": admin_id,
                "scheduledStart": "2030-05-06T08:00:00",
                "scheduledEnd": "2030-05-06T12:00:00"
            })
        )
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(assigned["job"]["assignees"][0]["id"], admin_id);
    assert_eq!(assigned["job"]["scheduledStart"], "2030-05-06T08:00:00");

    let (_, board) = send!(app, get("/api/dispatch/jobs?date=2030-05-06", &token));
    assert_eq!(board["jobs"].as_array().unwrap().len(), 1);
    let (_, board) = send!(app, get("/api/dispatch/jobs?date=2030-05-07", &token));
    assert!(board["jobs"].as_array().unwrap().is_empty());

    let (status, _) = send!(app, get("/api/dispatch/jobs?date=someday", &token));
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_issue_lifecycle() {
    let test_db = common::TestDb::new("test_issue_lifecycle.db");
    let app = app!(test_db);
    let token = login!(app);

    let (status, created) = send!(
        app,
        post(
            "/api/issues",
            &token,
            json!({ "title": "Gap at miter", "type": "QUALITY", "priority": "HIGH" })
        )
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["issue"]["status"], "OPEN");
    assert_eq!(created["issue"]["type"], "QUALITY");
    let id = created["issue"]["id"].as_i64().unwrap();

    let (status, _) = send!(app, post("/api/issues", &token, json!({ "title": " " })));
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, updated) = send!(
        app,
        put(
            &format!("/api/issues/{id}"),
            &token,
            json!({ "status": "RESOLVED" })
        )
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["issue"]["title"], "Gap at miter");
    assert!(!updated["issue"]["firstResponseAt"].is_null());
    assert!(!updated["issue"]["resolvedAt"].is_null());

    let (status, note) = send!(
        app,
        post(
            &format!("/api/issues/{id}/notes"),
            &token,
            json!({ "content": "Re-cut and caulked", "isInternal": true })
        )
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(note["note"]["isInternal"], true);

    let (_, detail) = send!(app, get(&format!("/api/issues/{id}"), &token));
    assert_eq!(detail["issue"]["notes"].as_array().unwrap().len(), 1);
    assert_eq!(detail["issue"]["watcherIds"].as_array().unwrap().len(), 1);

    let (_, watched) = send!(app, get("/api/issues?filter=watched", &token));
    assert_eq!(watched["pagination"]["total"], 1);
    let (_, assigned) = send!(app, get("/api/issues?filter=assigned", &token));
    assert_eq!(assigned["pagination"]["total"], 0);

    let (status, cancelled) = send!(app, delete(&format!("/api/issues/{id}"), &token));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["issue"]["status"], "CANCELLED");

    let (status, _) = send!(app, get("/api/issues/9999", &token));
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_tasks_filter_pending_and_complete() {
    let test_db = common::TestDb::new("test_tasks_filter_pending_and_complete.db");
    let app = app!(test_db);
    let token = login!(app);

    let (_, techs) = send!(app, get("/api/dispatch/techs", &token));
    let admin_id = techs["techs"][0]["id"].as_i64().unwrap();

    let (status, body) = send!(app, post("/api/tasks", &token, json!({ "title": "Order stock" })));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Assignee is required");

    let (status, created) = send!(
        app,
        post(
            "/api/tasks",
            &token,
            json!({
                "title": "Order stock",
                "assigneeId": admin_id,
                "priority": "URGENT",
                "subtasks": [{ "title": "Casing" }, { "title": "Nails" }]
            })
        )
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["task"]["status"], "TODO");
    assert_eq!(created["task"]["subtasks"].as_array().unwrap().len(), 2);
    let id = created["task"]["id"].as_i64().unwrap();

    let (_, pending) = send!(app, get("/api/tasks?status=PLANNING_PENDING&filter=my", &token));
    assert_eq!(pending["pagination"]["total"], 1);

    let (status, done) = send!(
        app,
        put(
            &format!("/api/tasks/{id}"),
            &token,
            json!({ "status": "COMPLETED" })
        )
    );
    assert_eq!(status, StatusCode::OK);
    assert!(!done["task"]["completedAt"].is_null());
    assert_eq!(done["task"]["subtasks"].as_array().unwrap().len(), 2);

    let (_, pending) = send!(app, get("/api/tasks?status=PLANNING_PENDING", &token));
    assert_eq!(pending["pagination"]["total"], 0);

    let (status, _) = send!(app, delete(&format!("/api/tasks/{id}"), &token));
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send!(app, get(&format!("/api/tasks/{id}"), &token));
    assert_eq!(status, StatusCode::NOT_FOUND);
}
