//! Business logic services layer

pub mod permission_service;

pub use permission_service::{
    permission_name, Action, AuthorizationOracle, PermissionService, ResourceType, Visibility,
};
