// src/services/groups.rs

use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{
        group::{Group, GroupDetail},
        user::{Requester, Role, User},
    },
};

/// Fetches a group by id.
pub async fn get_group(pool: &SqlitePool, group_id: i64) -> Result<Group, AppError> {
    sqlx::query_as::<_, Group>("SELECT id, name, teacher_id FROM student_groups WHERE id = ?")
        .bind(group_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Group not found".to_string()))
}

pub async fn is_member(
    pool: &SqlitePool,
    group_id: i64,
    student_id: i64,
) -> Result<bool, AppError> {
    let found = sqlx::query_scalar::<_, i64>(
        "SELECT 1 FROM group_students WHERE group_id = ? AND student_id = ?",
    )
    .bind(group_id)
    .bind(student_id)
    .fetch_optional(pool)
    .await?;

    Ok(found.is_some())
}

/// Teachers may only touch groups they own.
pub fn ensure_owner(requester: &Requester, group: &Group) -> Result<(), AppError> {
    if requester.role == Role::Teacher && group.teacher_id == requester.id {
        Ok(())
    } else {
        Err(AppError::Forbidden("You do not own this group.".to_string()))
    }
}

/// Owner teacher or enrolled student.
pub async fn ensure_access(
    pool: &SqlitePool,
    requester: &Requester,
    group: &Group,
) -> Result<(), AppError> {
    match requester.role {
        Role::Teacher => ensure_owner(requester, group),
        Role::Student => {
            if is_member(pool, group.id, requester.id).await? {
                Ok(())
            } else {
                Err(AppError::Forbidden(
                    "You are not a member of this group.".to_string(),
                ))
            }
        }
    }
}

/// Teachers see the groups they own, students the groups they belong to.
pub async fn list_groups(pool: &SqlitePool, requester: &Requester) -> Result<Vec<Group>, AppError> {
    let groups = match requester.role {
        Role::Teacher => {
            sqlx::query_as::<_, Group>(
                "SELECT id, name, teacher_id FROM student_groups WHERE teacher_id = ? ORDER BY id",
            )
            .bind(requester.id)
            .fetch_all(pool)
            .await?
        }
        Role::Student => {
            sqlx::query_as::<_, Group>(
                r#"
                SELECT g.id, g.name, g.teacher_id
                FROM student_groups g
                JOIN group_students gs ON g.id = gs.group_id
                WHERE gs.student_id = ?
                ORDER BY g.id
                "#,
            )
            .bind(requester.id)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(groups)
}

/// Group info including its roster.
pub async fn group_detail(
    pool: &SqlitePool,
    requester: &Requester,
    group_id: i64,
) -> Result<GroupDetail, AppError> {
    let group = get_group(pool, group_id).await?;
    ensure_access(pool, requester, &group).await?;

    let students = sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.name, u.role, u.personal_id
        FROM users u
        JOIN group_students gs ON u.id = gs.student_id
        WHERE gs.group_id = ?
        ORDER BY u.name
        "#,
    )
    .bind(group_id)
    .fetch_all(pool)
    .await?;

    Ok(GroupDetail { group, students })
}
