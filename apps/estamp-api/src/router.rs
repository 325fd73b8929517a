//! App Router
//!
//! ```text
//! GET    /healthcheck
//! GET    /templates
//! GET    /templates/{state}/{document_type}
//! POST   /orders
//! GET    /orders/{id}
//! PATCH  /orders/{id}/service
//! POST   /orders/{id}/promo            DELETE /orders/{id}/promo
//! POST   /orders/{id}/payment          POST   /orders/{id}/payment/verify
//! POST   /orders/{id}/generation/{start,complete,fail,retry}
//! POST   /orders/{id}/deliver          POST   /orders/{id}/cancel
//! POST   /promo-codes/validate
//! POST   /admin/templates              PUT    /admin/templates/{id}
//! POST   /admin/promo-codes            DELETE /admin/promo-codes/{code}
//! ```

use std::sync::Arc;

use salvo::{affix_state::inject, prelude::*, trailing_slash::remove_slash};

use crate::handlers::{admin, generation, health, orders, payment, promo, templates};
use crate::state::State;

pub fn app_router(state: Arc<State>) -> Router {
    Router::new()
        .hoop(CatchPanic::new())
        .hoop(remove_slash())
        .hoop(inject(state))
        .push(Router::with_path("healthcheck").get(health::handler))
        .push(
            Router::with_path("templates")
                .get(templates::list)
                .push(Router::with_path("{state}/{document_type}").get(templates::lookup)),
        )
        .push(
            Router::with_path("orders").post(orders::create).push(
                Router::with_path("{id}")
                    .get(orders::get)
                    .push(Router::with_path("service").patch(orders::change_service))
                    .push(
                        Router::with_path("promo")
                            .post(promo::apply)
                            .delete(promo::remove),
                    )
                    .push(
                        Router::with_path("payment")
                            .post(payment::create)
                            .push(Router::with_path("verify").post(payment::verify)),
                    )
                    .push(
                        Router::with_path("generation")
                            .push(Router::with_path("start").post(generation::start))
                            .push(Router::with_path("complete").post(generation::complete))
                            .push(Router::with_path("fail").post(generation::fail))
                            .push(Router::with_path("retry").post(generation::retry)),
                    )
                    .push(Router::with_path("deliver").post(orders::deliver))
                    .push(Router::with_path("cancel").post(orders::cancel)),
            ),
        )
        .push(Router::with_path("promo-codes/validate").post(promo::validate))
        .push(
            Router::with_path("admin")
                .push(
                    Router::with_path("templates")
                        .post(admin::create_template)
                        .push(Router::with_path("{id}").put(admin::update_template)),
                )
                .push(
                    Router::with_path("promo-codes")
                        .post(admin::create_promo)
                        .push(Router::with_path("{code}").delete(admin::deactivate_promo)),
                ),
        )
}
