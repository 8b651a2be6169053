mod category_list;
mod resource_detail;
mod resource_list;

pub use category_list::CategoryListView;
pub use resource_detail::ResourceDetailView;
pub use resource_list::ResourceListView;
