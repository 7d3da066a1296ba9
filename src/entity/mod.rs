pub mod courses;
pub mod enrollments;
pub mod lesson_completions;
pub mod lessons;
pub mod order_lines;
pub mod orders;
pub mod products;
pub mod users;

pub use courses::Entity as Courses;
pub use enrollments::Entity as Enrollments;
pub use lesson_completions::Entity as LessonCompletions;
pub use lessons::Entity as Lessons;
pub use order_lines::Entity as OrderLines;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use users::Entity as Users;
