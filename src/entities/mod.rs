//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod booking;
pub mod chef_application;
pub mod chef_profile;
pub mod course;
pub mod course_progress;
pub mod inquiry;
pub mod json;
pub mod order;
pub mod password_reset;
pub mod product;
pub mod service;
pub mod user;

// Re-export specific types to avoid conflicts
pub use booking::{
    BookingStatus, Column as BookingColumn, Entity as Booking, Model as BookingModel,
    PaymentStatus,
};
pub use chef_application::{
    ApplicationStatus, Column as ChefApplicationColumn, Entity as ChefApplication,
    Model as ChefApplicationModel,
};
pub use chef_profile::{
    Column as ChefProfileColumn, Entity as ChefProfile, Model as ChefProfileModel,
};
pub use course::{Column as CourseColumn, Entity as Course, Model as CourseModel};
pub use course_progress::{
    Column as CourseProgressColumn, Entity as CourseProgress, Model as CourseProgressModel,
};
pub use inquiry::{
    Column as InquiryColumn, Entity as Inquiry, InquiryStatus, Model as InquiryModel,
};
pub use json::{
    CourseModule, CourseModules, Lesson, OrderItem, OrderItems, ServiceTier, ServiceTiers,
    StringList,
};
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel, OrderStatus};
pub use password_reset::{Entity as PasswordReset, Model as PasswordResetModel};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use service::{
    Column as ServiceColumn, Entity as Service, Model as ServiceModel, ServiceKind,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel, Role};
