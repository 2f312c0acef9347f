pub mod hit;
pub mod modify;
pub mod session;
pub mod snap;
pub mod transform;

pub mod errors {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum KernelError {
        #[error("entity with id {0} not found")]
        EntityNotFound(u64),
    }

    /// 变换操作在调用边界即拒绝的非法参数。操作保持无副作用，
    /// 调用方据此重新提示输入；内核从不以异常传播这些情况。
    #[derive(Debug, Error)]
    pub enum TransformError {
        #[error("scale factor must be positive, got {0}")]
        InvalidScaleFactor(f64),
        #[error("offset would produce a non-positive radius {0}")]
        InvalidOffsetRadius(f64),
        #[error("rectangular pattern counts must be at least 1, got {x}x{y}")]
        InvalidRectCount { x: usize, y: usize },
        #[error("circular pattern needs at least 2 items, got {0}")]
        InvalidCircularCount(usize),
        #[error("entity with id {0} not found")]
        EntityNotFound(u64),
    }
}
