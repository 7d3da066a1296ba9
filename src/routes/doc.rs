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
    dto::{
        auth::{AuthResponse, LoginRequest, RegisterRequest, UserPublic},
        cart::{AddToCartRequest, CartItemView, CartView, RemoveFromCartRequest, UpdateCartRequest},
        courses::{CourseDetail, CourseList, CourseView, LessonView},
        orders::{
            AdminOrderList, AdminOrderSummary, CheckoutRequest, OrderList, OrderReceipt,
            OrderSummary, OrderWithLines, UpdateOrderStatusRequest,
        },
        products::{ProductList, ProductView},
    },
    models::{Enrollment, ItemKind, Order, OrderLine},
    response::{ApiResponse, Meta},
    routes::{auth, cart, courses, health, orders, params, products},
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
        auth::register,
        auth::login,
        auth::profile,
        cart::view_cart,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        cart::clear_cart,
        courses::list_courses,
        courses::get_course,
        courses::enroll,
        courses::complete_lesson,
        orders::place_order,
        orders::my_orders,
        orders::get_order,
        orders::list_all_orders,
        orders::update_order_status,
        products::list_products,
        products::get_product
    ),
    components(
        schemas(
            ItemKind,
            Order,
            OrderLine,
            Enrollment,
            RegisterRequest,
            LoginRequest,
            UserPublic,
            AuthResponse,
            AddToCartRequest,
            UpdateCartRequest,
            RemoveFromCartRequest,
            CartItemView,
            CartView,
            CourseView,
            CourseList,
            LessonView,
            CourseDetail,
            CheckoutRequest,
            OrderReceipt,
            OrderSummary,
            AdminOrderSummary,
            OrderList,
            AdminOrderList,
            OrderWithLines,
            UpdateOrderStatusRequest,
            ProductView,
            ProductList,
            params::ProductQuery,
            params::CourseQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<CartView>,
            ApiResponse<CourseList>,
            ApiResponse<CourseDetail>,
            ApiResponse<OrderReceipt>,
            ApiResponse<OrderList>,
            ApiResponse<AdminOrderList>,
            ApiResponse<OrderWithLines>,
            ApiResponse<ProductList>,
            ApiResponse<ProductView>,
            ApiResponse<AuthResponse>,
            ApiResponse<UserPublic>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login and profile"),
        (name = "Cart", description = "Cart endpoints for users and guests"),
        (name = "Courses", description = "Course catalog, enrollment and lesson progress"),
        (name = "Orders", description = "Checkout and order endpoints"),
        (name = "Products", description = "Product catalog endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
