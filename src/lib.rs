// 全局内存分配器：使用 jemalloc
#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

// 分层结构：domain 不依赖其他层，application 驱动 domain，
// infrastructure 和 interfaces 负责网络、观测与命令行
pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod interfaces;
pub mod shared;
