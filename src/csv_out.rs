use crate::errors::AppError;
use crate::model::LastHeardRecord;
use csv::Writer;
use std::path::Path;

pub fn write_csv(records: &[LastHeardRecord], out_path: &Path) -> Result<(), AppError> {
    let mut wtr = Writer::from_path(out_path)
        .map_err(|e| AppError::IO(format!("open out csv: {}", e)))?;

    // Header (once per file)
    wtr.write_record(&[
        "timestamp","mode","callsign","target","source",
        "duration","loss","ber",
    ]).map_err(|e| AppError::IO(format!("csv write header: {}", e)))?;

    for r in records {
        let ber = r.ber.map(|b| b.to_string()).unwrap_or_default();

        wtr.write_record(&[
            r.timestamp.to_rfc3339(),
            r.mode.clone(),
            r.callsign.clone(),
            r.target.clone(),
            r.source.clone(),
            r.duration.to_string(),
            r.loss.to_string(),
            ber, // empty when unknown
        ]).map_err(|e| AppError::IO(format!("csv write row: {}", e)))?;
    }

    wtr.flush().map_err(|e| AppError::IO(format!("csv flush: {}", e)))?;
    Ok(())
}
