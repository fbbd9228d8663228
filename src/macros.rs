/// SDL reports most errors as plain strings, wrap them into a report.
macro_rules! fw_error {
    ($e:expr) => {
        $e.map_err(|e| eyre::eyre!("SDL error: {}", e))?
    };
}

pub(crate) use fw_error;
