// 領域層：請求範圍的模型與 adapters 實作的 ports

pub mod model;
pub mod ports;
