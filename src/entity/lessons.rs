use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "lessons")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub duration: String,
    pub video_url: Option<String>,
    pub order_index: i32,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::courses::Entity",
        from = "Column::CourseId",
        to = "super::courses::Column::Id"
    )]
    Courses,
    #[sea_orm(has_many = "super::lesson_completions::Entity")]
    LessonCompletions,
}

impl Related<super::courses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Courses.def()
    }
}

impl Related<super::lesson_completions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LessonCompletions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
