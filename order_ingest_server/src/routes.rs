//! Request handler definitions
//!
//! The HTTP surface is a liveness probe and a read-only order lookup. Orders are only ever written
//! by the message consumer.
//!
//! Handlers run on actix worker threads and must not block. All backend access goes through async calls on the
//! [`OrderFlowApi`].
use actix_web::{get, web, web::ServiceConfig, HttpResponse, Responder};
use log::*;
use order_ingest_engine::{db_types::OrderUid, OrderCache, OrderFlowApi, OrderStore};
use serde_json::json;

use crate::errors::ServerError;

// Actix cannot register generic handlers directly, so the route structs are generated with the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

/// Registers every route. The [`OrderFlowApi`] for the same backends must be supplied as app data.
pub fn configure_routes<S, C>(cfg: &mut ServiceConfig)
where
    S: OrderStore + 'static,
    C: OrderCache + 'static,
{
    cfg.service(live).service(FetchOrderRoute::<S, C>::new());
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/live")]
pub async fn live() -> impl Responder {
    trace!("💻️ Received liveness check");
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

// ----------------------------------------------   Orders  ----------------------------------------------------
route!(fetch_order => Get "/orders/{order_uid}" impl OrderStore, OrderCache);
/// Returns the order with the given uid, from the cache if possible, otherwise from the store.
pub async fn fetch_order<S, C>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<S, C>>,
) -> Result<HttpResponse, ServerError>
where
    S: OrderStore,
    C: OrderCache,
{
    let order_uid = OrderUid::from(path.into_inner());
    debug!("💻️ GET order {order_uid}");
    let order = api.fetch_order(&order_uid).await.map_err(|e| {
        debug!("💻️ Could not fetch order {order_uid}. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(order))
}
