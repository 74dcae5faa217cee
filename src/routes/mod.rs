//! HTTP handlers of the JSON API, mounted under `/api`.
//!
//! Handlers stay thin: they extract the caller and payload, call the
//! matching service and shape the JSON envelope.

use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpResponse, web};

use crate::dto::CsvFile;

pub mod activities;
pub mod auth;
pub mod bundles;
pub mod clients;
pub mod dispatch;
pub mod documents;
pub mod estimates;
pub mod invoices;
pub mod issues;
pub mod items;
pub mod jobs;
pub mod leads;
pub mod notifications;
pub mod purchase_orders;
pub mod tasks;
pub mod users;
pub mod webhooks;

/// Registers every API handler on the given scope.
///
/// Fixed paths such as `/clients/export` are registered before their
/// `/{id}` siblings so they win the match.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(auth::login)
        .service(auth::refresh)
        .service(auth::logout)
        .service(auth::set_password)
        .service(auth::permissions)
        .service(auth::bootstrap_admin)
        .service(users::list_users)
        .service(users::invite_user)
        .service(clients::export_clients)
        .service(clients::list_clients)
        .service(clients::create_client)
        .service(clients::get_client)
        .service(clients::update_client)
        .service(clients::delete_client)
        .service(leads::list_leads)
        .service(leads::create_lead)
        .service(leads::get_lead)
        .service(leads::update_lead)
        .service(leads::delete_lead)
        .service(leads::convert_lead)
        .service(leads::convert_lead_to_estimate)
        .service(items::export_items)
        .service(items::import_items)
        .service(items::list_items)
        .service(items::create_item)
        .service(items::get_item)
        .service(items::update_item)
        .service(items::delete_item)
        .service(bundles::list_bundles)
        .service(bundles::create_bundle)
        .service(bundles::get_bundle)
        .service(bundles::update_bundle)
        .service(bundles::delete_bundle)
        .service(bundles::flatten_bundle)
        .service(estimates::list_estimates)
        .service(estimates::create_estimate)
        .service(estimates::get_estimate)
        .service(estimates::update_estimate)
        .service(estimates::delete_estimate)
        .service(estimates::convert_to_job)
        .service(estimates::convert_to_invoice)
        .service(invoices::list_invoices)
        .service(invoices::create_invoice)
        .service(invoices::get_invoice)
        .service(invoices::update_invoice)
        .service(invoices::delete_invoice)
        .service(invoices::record_payment)
        .service(invoices::public_invoice)
        .service(purchase_orders::list_purchase_orders)
        .service(purchase_orders::create_purchase_order)
        .service(purchase_orders::get_purchase_order)
        .service(purchase_orders::update_purchase_order)
        .service(purchase_orders::delete_purchase_order)
        .service(purchase_orders::approve_purchase_order)
        .service(purchase_orders::receive_purchase_order)
        .service(documents::list_lines)
        .service(documents::add_line)
        .service(documents::update_line)
        .service(documents::delete_line)
        .service(documents::add_bundle)
        .service(documents::ungroup)
        .service(documents::update_group_from_template)
        .service(documents::delete_group)
        .service(jobs::list_jobs)
        .service(jobs::create_job)
        .service(jobs::get_job)
        .service(jobs::update_job)
        .service(jobs::delete_job)
        .service(jobs::set_status)
        .service(jobs::set_assignments)
        .service(dispatch::board)
        .service(dispatch::technicians)
        .service(dispatch::assign)
        .service(issues::list_issues)
        .service(issues::create_issue)
        .service(issues::get_issue)
        .service(issues::update_issue)
        .service(issues::delete_issue)
        .service(issues::list_notes)
        .service(issues::add_note)
        .service(tasks::list_tasks)
        .service(tasks::create_task)
        .service(tasks::get_task)
        .service(tasks::update_task)
        .service(tasks::delete_task)
        .service(webhooks::payments)
        .service(notifications::notification_stream)
        .service(notifications::read_all)
        .service(notifications::list_notifications)
        .service(notifications::mark_read)
        .service(activities::list_activities);
}

/// Answers a generated CSV as a file download.
pub fn csv_attachment(file: CsvFile) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(file.filename)],
        })
        .body(file.content)
}
