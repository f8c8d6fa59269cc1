// Domain-layer modules and shared errors/models
pub mod errors {
    pub use crate::errors::*;
}

pub mod features {
    pub use crate::features::*;
}

pub mod model {
    pub use crate::model::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod scoring {
    pub use crate::scoring::*;
}

pub mod trainer {
    pub use crate::trainer::*;
}
