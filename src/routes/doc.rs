use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    compatibility::CompatibilityIssue,
    dto::{
        auth::{LoginRequest, LoginResponse, PasswordResetRequest, Profile, RegisterRequest},
        builds::{BuildComponents, BuildDetail, BuildList, BuildPreview, BuildRequest},
        cart::{AddToCartRequest, CartLine, CartList},
        catalog::{
            ComponentList, CreateComponentRequest, CreateManufacturerRequest, CreateReviewRequest,
            ManufacturerList, ReviewList, UpdateComponentRequest,
        },
        orders::{CheckoutRequest, OrderList, OrderWithItems, StaffOrder, StaffOrderList, UpdateOrderStatusRequest},
        returns::{CreateReturnRequest, ProcessReturnRequest, ReturnList},
        stock::{StockAdjustRequest, StockList},
        wallet::{ConfirmTopUpRequest, PendingTopUp, TopUpRequest, WalletOverview},
    },
    models::{
        Balance, Build, CartItem, CaseSpecs, Component, ComponentKind, ComponentSpecs,
        CoolerSpecs, CoolerType, CpuSpecs, DeliveryOption, GpuSpecs, Manufacturer,
        MotherboardSpecs, Order, OrderItem, OrderStatus, PaymentMethod, PsuSpecs, RamSpecs,
        ReturnRequest, ReturnStatus, Review, StockRecord, StorageSpecs, Transaction,
        TransactionType, User,
    },
    response::{ApiResponse, Meta},
    routes::{auth, builds, cart, catalog, health, orders, params, returns, staff, wallet},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::readiness,
        auth::register,
        auth::login,
        auth::password_reset,
        auth::me,
        catalog::list_manufacturers,
        catalog::get_manufacturer,
        catalog::create_manufacturer,
        catalog::list_components,
        catalog::get_component,
        catalog::create_component,
        catalog::update_component,
        catalog::delete_component,
        catalog::list_reviews,
        catalog::create_review,
        builds::list_builds,
        builds::create_build,
        builds::preview_build,
        builds::get_build,
        builds::update_build,
        builds::delete_build,
        builds::compatible_motherboards,
        builds::compatible_rams,
        builds::compatible_cpus,
        cart::cart_list,
        cart::add_to_cart,
        cart::remove_from_cart,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        orders::track_order,
        returns::list_my_returns,
        returns::create_return,
        wallet::wallet,
        wallet::request_topup,
        wallet::confirm_topup,
        staff::list_active_orders,
        staff::list_order_history,
        staff::get_order_staff,
        staff::update_order_status,
        staff::complete_order,
        staff::list_stock,
        staff::list_low_stock,
        staff::replenish_stock,
        staff::reduce_stock,
        staff::list_returns,
        staff::process_return
    ),
    components(
        schemas(
            User,
            Manufacturer,
            ComponentKind,
            ComponentSpecs,
            CpuSpecs,
            GpuSpecs,
            MotherboardSpecs,
            RamSpecs,
            StorageSpecs,
            PsuSpecs,
            CaseSpecs,
            CoolerSpecs,
            CoolerType,
            Component,
            Review,
            Build,
            CartItem,
            Order,
            OrderItem,
            OrderStatus,
            DeliveryOption,
            PaymentMethod,
            ReturnRequest,
            ReturnStatus,
            StockRecord,
            Balance,
            Transaction,
            TransactionType,
            CompatibilityIssue,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            PasswordResetRequest,
            Profile,
            CreateManufacturerRequest,
            ManufacturerList,
            CreateComponentRequest,
            UpdateComponentRequest,
            ComponentList,
            CreateReviewRequest,
            ReviewList,
            BuildRequest,
            BuildComponents,
            BuildDetail,
            BuildPreview,
            BuildList,
            AddToCartRequest,
            CartLine,
            CartList,
            CheckoutRequest,
            OrderWithItems,
            OrderList,
            StaffOrder,
            StaffOrderList,
            UpdateOrderStatusRequest,
            CreateReturnRequest,
            ProcessReturnRequest,
            ReturnList,
            StockAdjustRequest,
            StockList,
            TopUpRequest,
            PendingTopUp,
            ConfirmTopUpRequest,
            WalletOverview,
            params::Pagination,
            params::SortOrder,
            params::ComponentSortBy,
            params::ComponentQuery,
            params::OrderListQuery,
            params::StaffOrderQuery,
            params::StockQuery,
            params::LowStockQuery,
            Meta,
            ApiResponse<Component>,
            ApiResponse<ComponentList>,
            ApiResponse<BuildDetail>,
            ApiResponse<CartList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<StaffOrderList>,
            ApiResponse<StockList>,
            ApiResponse<WalletOverview>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login and password reset"),
        (name = "Catalog", description = "Manufacturers, components and reviews"),
        (name = "Builds", description = "PC builds and compatibility lookups"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Checkout and order tracking"),
        (name = "Returns", description = "Return requests"),
        (name = "Wallet", description = "Balance, ledger and top-ups"),
        (name = "Staff", description = "Order, stock and return management"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
