//! 数据模型模块

pub mod descriptor;
pub mod page;
pub mod service;
pub mod template;
