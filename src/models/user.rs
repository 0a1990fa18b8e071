//! Modelo de User (colaborador de solo lectura)
//!
//! El CRUD de usuarios y departamentos vive en otro servicio; aquí solo
//! se leen identidad, rol y pertenencia a departamento.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Rol del usuario - mapea al ENUM user_role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Requester,
    Approver,
    Sysadmin,
}

impl UserRole {
    pub fn parse(value: &str) -> Option<UserRole> {
        match value {
            "requester" => Some(UserRole::Requester),
            "approver" => Some(UserRole::Approver),
            "sysadmin" => Some(UserRole::Sysadmin),
            _ => None,
        }
    }
}

/// User - mapea a la tabla users
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: UserRole,
    pub department_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Identidad actuante extraída del token, usada por las reglas de autorización
#[derive(Debug, Clone, Copy)]
pub struct ActingUser {
    pub id: Uuid,
    pub role: UserRole,
}

impl ActingUser {
    pub fn is_sysadmin(&self) -> bool {
        self.role == UserRole::Sysadmin
    }
}
