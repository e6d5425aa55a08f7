use crate::errors::AppError;
use crate::models::{Lead, NewLead};
use crate::repository::LeadRepository;
use crate::scoring::ScoringClient;

/// Normalizes one CSV header to a `leads` column name.
///
/// The marketing dataset uses dotted headers (`emp.var.rate`) and a
/// `default` column that would collide with the SQL keyword; both are
/// rewritten here so `NewLead::set` sees canonical names.
pub fn normalize_header(raw: &str) -> String {
    let header = raw.trim().trim_matches('"').replace('.', "_");
    if header == "default" {
        "credit_default".to_string()
    } else {
        header
    }
}

/// Parses CSV bytes into pre-shaped lead records.
///
/// The dataset ships with `;` separators but plain `,` exports are common,
/// so `;` is tried first and `,` used when that yields fewer than two
/// columns. Unknown columns are dropped silently before the records reach
/// the repository.
pub fn parse_rows(data: &[u8]) -> Result<Vec<NewLead>, AppError> {
    if let Some(rows) = read_rows(data, b';')? {
        return Ok(rows);
    }
    read_rows(data, b',')?.ok_or_else(|| {
        AppError::Validation("CSV must contain at least two columns".to_string())
    })
}

fn read_rows(data: &[u8], delimiter: u8) -> Result<Option<Vec<NewLead>>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::Validation(format!("Invalid CSV header: {}", e)))?
        .iter()
        .map(normalize_header)
        .collect();
    if headers.len() < 2 {
        return Ok(None);
    }

    let mut leads = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| AppError::Validation(format!("Invalid CSV row: {}", e)))?;
        let mut lead = NewLead::default();
        for (header, value) in headers.iter().zip(record.iter()) {
            lead.set(header, value);
        }
        leads.push(lead);
    }
    Ok(Some(leads))
}

/// Ingests a whole CSV upload: parse, score each row via the prediction
/// service, persist. One input row becomes one lead paired with its
/// prediction result; any scoring or store error aborts the upload.
pub async fn ingest_csv(
    repo: &LeadRepository,
    scoring: &ScoringClient,
    data: &[u8],
) -> Result<Vec<Lead>, AppError> {
    let rows = parse_rows(data)?;
    tracing::info!("Parsed {} CSV rows for ingestion", rows.len());

    let mut saved = Vec::with_capacity(rows.len());
    for row in &rows {
        let fields = serde_json::to_value(row)
            .map_err(|e| AppError::Internal(format!("Failed to serialize lead row: {}", e)))?;
        let prediction = scoring.predict(&fields).await?;
        saved.push(repo.create(row, &prediction).await?);
    }

    tracing::info!("Ingested {} leads", saved.len());
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_normalize_dots_and_default() {
        assert_eq!(normalize_header("emp.var.rate"), "emp_var_rate");
        assert_eq!(normalize_header("default"), "credit_default");
        assert_eq!(normalize_header(" age "), "age");
        assert_eq!(normalize_header("\"cons.price.idx\""), "cons_price_idx");
    }

    #[test]
    fn semicolon_csv_parses() {
        let data = b"age;job;euribor3m\n41;technician;4.857\n";
        let rows = parse_rows(data).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].age, Some(41));
        assert_eq!(rows[0].job.as_deref(), Some("technician"));
        assert_eq!(rows[0].euribor3m, Some(4.857));
    }

    #[test]
    fn falls_back_to_comma_delimiter() {
        let data = b"age,job\n35,admin.\n";
        let rows = parse_rows(data).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].age, Some(35));
        assert_eq!(rows[0].job.as_deref(), Some("admin."));
    }

    #[test]
    fn unknown_columns_are_dropped() {
        let data = b"age;favorite_color;job\n29;blue;services\n";
        let rows = parse_rows(data).unwrap();
        assert_eq!(rows[0].age, Some(29));
        assert_eq!(rows[0].job.as_deref(), Some("services"));
        // No field for favorite_color exists; nothing else changed.
        assert!(rows[0].marital.is_none());
    }

    #[test]
    fn dotted_headers_map_to_fields() {
        let data = b"emp.var.rate;nr.employed;default\n1.1;5191;no\n";
        let rows = parse_rows(data).unwrap();
        assert_eq!(rows[0].emp_var_rate, Some(1.1));
        assert_eq!(rows[0].nr_employed, Some(5191.0));
        assert_eq!(rows[0].credit_default.as_deref(), Some("no"));
    }

    #[test]
    fn unparseable_numbers_become_none() {
        let data = b"age;job\nunknown;retired\n";
        let rows = parse_rows(data).unwrap();
        assert_eq!(rows[0].age, None);
        assert_eq!(rows[0].job.as_deref(), Some("retired"));
    }

    #[test]
    fn single_column_input_is_rejected() {
        let data = b"age\n35\n";
        assert!(parse_rows(data).is_err());
    }
}
