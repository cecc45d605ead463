mod trail;

pub use trail::Trail;
