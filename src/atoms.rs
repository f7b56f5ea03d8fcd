// 端口探测原子模块

pub mod port_checker;

// 导出公共接口
pub use port_checker::{check_port_available, get_free_port, is_address_valid};
