mod entity_table;
mod record_detail;

pub use entity_table::EntityTableView;
pub use record_detail::RecordDetailView;
