pub mod format;
pub mod job;
pub mod mock;
pub mod page;
pub mod results;
pub mod validation;

pub use format::{
    format_currency, format_date, format_date_time, format_file_size, format_number,
    format_percent, format_status, get_status_color, report_file_name, StatusColor,
};
pub use job::{BatchJob, BatchJobStatus, CountViolation, JobId};
pub use page::{total_pages, JobListing, Page};
pub use results::{ActionAck, BatchReport, JobStatusReport, UploadReceipt};
pub use validation::{
    mime_type_for, validate_upload, ValidationError, ACCEPTED_EXTENSIONS, ACCEPTED_MIME_TYPES,
    MAX_UPLOAD_BYTES,
};
