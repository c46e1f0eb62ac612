use std::time::Duration;

/// Interval between status checks while waiting for a job.
///
/// The first check happens one full interval after polling starts.
pub const POLL_INTERVAL: Duration = Duration::from_millis(1200);

/// Upload endpoint, relative to the API base.
pub const UPLOAD_PATH: &str = "/uploads/image";

/// Prefix shared by the status endpoint and the push channel.
pub const RESULTS_PATH: &str = "/results";

/// Multipart field name carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "image";

/// Filename sent when the request does not carry one.
pub const DEFAULT_FILENAME: &str = "upload.jpg";

/// Fields of an upload response that may carry the job identifier, in
/// lookup order.
pub const JOB_ID_FIELDS: [&str; 3] = ["jobId", "id", "resultId"];

/// Fields of a status response or push message that may carry the result
/// identifier, in lookup order.
pub const RESULT_ID_FIELDS: [&str; 3] = ["resultId", "id", "jobId"];

/// Boolean-ish readiness flags accepted in a status response.
pub const READY_FLAGS: [&str; 3] = ["ready", "done", "completed"];

/// `status` value that marks a job as finished.
pub const STATUS_DONE: &str = "done";

/// Highest percent reported while the total transfer size is unknown.
pub const UNKNOWN_TOTAL_CAP: u8 = 99;

/// Bytes per percent point used for the unknown-total estimate.
pub const UNKNOWN_TOTAL_BYTES_PER_PERCENT: u64 = 1000;

/// Maximum push message size accepted from the server (1 MB).
pub const PUSH_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Failure reason when no upload transport is available.
pub const REASON_TRANSPORT_UNAVAILABLE: &str = "transport unavailable";

/// Failure reason when the server accepted the upload without a job id.
pub const REASON_NO_JOB_ID: &str = "no job id returned";
