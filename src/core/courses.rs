//! Cooking courses and learners' progress through them.

use crate::{
    config::catalog::CourseConfig,
    entities::{Course, CourseModules, CourseProgress, StringList, course, course_progress},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{info, instrument};

/// Progress report sent by a learner
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub course_id: i64,
    #[serde(default)]
    pub completed_lessons: Vec<String>,
    #[serde(default)]
    pub last_viewed_lesson: Option<String>,
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(needle))
}

fn validate_course(input: &CourseConfig) -> Result<()> {
    if input.title.trim().is_empty() {
        return Err(Error::invalid_input("Course title cannot be empty"));
    }
    if !input.price.is_finite() || input.price < 0.0 {
        return Err(Error::invalid_input(format!(
            "Course price must be zero or positive, got {}",
            input.price
        )));
    }
    let mut seen = HashSet::new();
    for lesson in input.modules.iter().flat_map(|m| m.lessons.iter()) {
        if lesson.id.trim().is_empty() {
            return Err(Error::invalid_input("Every lesson needs an id"));
        }
        if !seen.insert(lesson.id.as_str()) {
            return Err(Error::invalid_input(format!(
                "Lesson id '{}' is used twice",
                lesson.id
            )));
        }
    }
    Ok(())
}

/// Lists courses, optionally filtered.
///
/// `category` must match exactly (ignoring case); `query` matches anywhere in
/// the title, description or category.
pub async fn list_courses(
    db: &DatabaseConnection,
    query: Option<&str>,
    category: Option<&str>,
) -> Result<Vec<course::Model>> {
    let query = query.map(|q| q.trim().to_lowercase()).filter(|q| !q.is_empty());
    let category = category.map(str::trim).filter(|c| !c.is_empty());

    let courses = Course::find()
        .order_by_asc(course::Column::Id)
        .all(db)
        .await?;
    Ok(courses
        .into_iter()
        .filter(|c| {
            category.is_none_or(|wanted| {
                c.category
                    .as_deref()
                    .is_some_and(|have| have.eq_ignore_ascii_case(wanted))
            })
        })
        .filter(|c| {
            query.as_deref().is_none_or(|q| {
                c.title.to_lowercase().contains(q)
                    || contains_ci(c.description.as_deref(), q)
                    || contains_ci(c.category.as_deref(), q)
            })
        })
        .collect())
}

pub async fn get_course<C>(db: &C, course_id: i64) -> Result<Option<course::Model>>
where
    C: ConnectionTrait,
{
    Course::find_by_id(course_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a course.
///
/// # Errors
/// `InvalidInput` for an empty title, a negative price, or a lesson id that is
/// empty or repeated within the course.
#[instrument(skip(db, input), fields(title = %input.title))]
pub async fn create_course(db: &DatabaseConnection, input: &CourseConfig) -> Result<course::Model> {
    validate_course(input)?;

    let now = chrono::Utc::now();
    let course = course::ActiveModel {
        title: Set(input.title.trim().to_string()),
        description: Set(input.description.clone()),
        category: Set(input.category.clone()),
        price: Set(input.price),
        image: Set(input.image.clone()),
        duration: Set(input.duration.clone()),
        modules: Set(CourseModules(input.modules.clone())),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(course_id = course.id, "Course created");
    Ok(course)
}

/// Replaces a course's details and lesson tree.
///
/// Progress rows keep lesson ids that no longer exist; they simply stop
/// counting towards the course.
#[instrument(skip(db, input))]
pub async fn update_course(
    db: &DatabaseConnection,
    course_id: i64,
    input: &CourseConfig,
) -> Result<course::Model> {
    validate_course(input)?;
    let course = get_course(db, course_id)
        .await?
        .ok_or_else(|| Error::not_found("Course", course_id))?;

    let mut active: course::ActiveModel = course.into();
    active.title = Set(input.title.trim().to_string());
    active.description = Set(input.description.clone());
    active.category = Set(input.category.clone());
    active.price = Set(input.price);
    active.image = Set(input.image.clone());
    active.duration = Set(input.duration.clone());
    active.modules = Set(CourseModules(input.modules.clone()));
    active.updated_at = Set(chrono::Utc::now());
    active.update(db).await.map_err(Into::into)
}

/// Deletes a course together with everyone's progress on it.
#[instrument(skip(db))]
pub async fn delete_course(db: &DatabaseConnection, course_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    if get_course(&txn, course_id).await?.is_none() {
        return Err(Error::not_found("Course", course_id));
    }
    CourseProgress::delete_many()
        .filter(course_progress::Column::CourseId.eq(course_id))
        .exec(&txn)
        .await?;
    Course::delete_by_id(course_id).exec(&txn).await?;
    txn.commit().await?;

    info!(course_id, "Course deleted");
    Ok(())
}

/// Inserts the catalog's courses when the table is empty. Returns how many were inserted.
pub async fn seed_courses(db: &DatabaseConnection, courses: &[CourseConfig]) -> Result<usize> {
    if Course::find().count(db).await? > 0 {
        return Ok(0);
    }
    for entry in courses {
        create_course(db, entry).await?;
    }
    info!(courses = courses.len(), "Course seeding finished");
    Ok(courses.len())
}

/// Stores a learner's progress on one course, replacing what was there.
///
/// Completed lessons are deduplicated in the order given.
///
/// # Errors
/// `NotFound` for an unknown course, `InvalidInput` when a lesson id does not
/// belong to the course.
#[instrument(skip(db, update), fields(course_id = update.course_id))]
pub async fn record_progress(
    db: &DatabaseConnection,
    user_id: i64,
    update: ProgressUpdate,
) -> Result<course_progress::Model> {
    let course = get_course(db, update.course_id)
        .await?
        .ok_or_else(|| Error::not_found("Course", update.course_id))?;
    let known: HashSet<&str> = course.modules.lessons().map(|l| l.id.as_str()).collect();

    let mut completed = Vec::with_capacity(update.completed_lessons.len());
    for lesson in update.completed_lessons {
        if !known.contains(lesson.as_str()) {
            return Err(Error::invalid_input(format!(
                "Lesson '{lesson}' is not part of course {}",
                course.id
            )));
        }
        if !completed.contains(&lesson) {
            completed.push(lesson);
        }
    }
    if let Some(last) = update.last_viewed_lesson.as_deref() {
        if !known.contains(last) {
            return Err(Error::invalid_input(format!(
                "Lesson '{last}' is not part of course {}",
                course.id
            )));
        }
    }

    let txn = db.begin().await?;
    let existing = CourseProgress::find()
        .filter(course_progress::Column::UserId.eq(user_id))
        .filter(course_progress::Column::CourseId.eq(course.id))
        .one(&txn)
        .await?;
    let progress = match existing {
        Some(row) => {
            let mut active: course_progress::ActiveModel = row.into();
            active.completed_lessons = Set(StringList(completed));
            active.last_viewed_lesson = Set(update.last_viewed_lesson);
            active.updated_at = Set(chrono::Utc::now());
            active.update(&txn).await?
        }
        None => {
            course_progress::ActiveModel {
                user_id: Set(user_id),
                course_id: Set(course.id),
                completed_lessons: Set(StringList(completed)),
                last_viewed_lesson: Set(update.last_viewed_lesson),
                updated_at: Set(chrono::Utc::now()),
                ..Default::default()
            }
            .insert(&txn)
            .await?
        }
    };
    txn.commit().await?;
    Ok(progress)
}

pub async fn list_progress_for_user(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<course_progress::Model>> {
    CourseProgress::find()
        .filter(course_progress::Column::UserId.eq(user_id))
        .order_by_asc(course_progress::Column::CourseId)
        .all(db)
        .await
        .map_err(Into::into)
}
