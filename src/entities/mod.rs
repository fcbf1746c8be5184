pub mod category;
pub mod coupon;
pub mod menu_item;
pub mod order;
pub mod order_item;
pub mod promotion;
pub mod top_pick;
