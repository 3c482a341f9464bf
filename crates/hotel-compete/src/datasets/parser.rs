use super::domain::{ChannelConfig, Dataset, InternalRate, OfferObservation};
use super::normalizer::{
    is_affirmative, parse_count, parse_day_first_date, parse_price, split_markets,
};
use super::DatasetLoadError;
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use std::io::Read;

pub(crate) const INTERNAL_RATE_COLUMNS: &[&str] = &[
    "Nombre_Hotel",
    "PoS",
    "PamBaseRate ($)",
    "contractcurrencybase_pam",
];

pub(crate) const EXTERNAL_OFFER_COLUMNS: &[&str] = &[
    "Nombre_Hotel",
    "PoS",
    "check_in",
    "check_out",
    "los",
    "adults",
    "children",
    "price_despegar (USD)",
    "buyers_best_price_competitor_total (USD)",
    "agency_name",
];

pub(crate) const CHANNEL_CONFIG_COLUMNS: &[&str] = &[
    "Hotel",
    "Api_Tildado",
    "HTML_Tildado",
    "availableWrapper",
    "PrepagoActivo",
    "Rate_type",
    "Pos_Tildado",
    "Disponibilidad",
];

pub(crate) fn parse_internal_rates<R: Read>(
    reader: R,
) -> Result<Vec<InternalRate>, DatasetLoadError> {
    let dataset = Dataset::InternalRates;
    read_rows::<_, InternalRateRow>(reader, dataset, INTERNAL_RATE_COLUMNS)?
        .into_iter()
        .map(|(line, row)| -> Result<InternalRate, DatasetLoadError> {
            let contracted_rate = required_price(dataset, line, "PamBaseRate ($)", &row.base_rate)?;
            let exp_base_rate =
                optional_price(dataset, line, "ExpBaseRate ($)", row.exp_base_rate.as_deref())?;
            let hbg_base_rate =
                optional_price(dataset, line, "HBGBaseRate ($)", row.hbg_base_rate.as_deref())?;

            Ok(InternalRate {
                hotel: row.hotel,
                market: row.market,
                contracted_rate,
                currency: row.currency,
                exp_base_rate,
                hbg_base_rate,
            })
        })
        .collect()
}

pub(crate) fn parse_external_offers<R: Read>(
    reader: R,
) -> Result<Vec<OfferObservation>, DatasetLoadError> {
    let dataset = Dataset::ExternalOffers;
    read_rows::<_, ExternalOfferRow>(reader, dataset, EXTERNAL_OFFER_COLUMNS)?
        .into_iter()
        .map(|(line, row)| -> Result<OfferObservation, DatasetLoadError> {
            let check_in = required_date(dataset, line, "check_in", &row.check_in)?;
            let check_out = required_date(dataset, line, "check_out", &row.check_out)?;
            let stay_length = required_count(dataset, line, "los", &row.stay_length)?;
            let adults = required_count(dataset, line, "adults", &row.adults)?;
            let children = required_count(dataset, line, "children", &row.children)?;
            let own_price = optional_price(
                dataset,
                line,
                "price_despegar (USD)",
                row.own_price.as_deref(),
            )?;
            let competitor_price = optional_price(
                dataset,
                line,
                "buyers_best_price_competitor_total (USD)",
                row.competitor_price.as_deref(),
            )?;

            Ok(OfferObservation {
                hotel: row.hotel,
                market: row.market,
                check_in,
                check_out,
                stay_length,
                adults,
                children,
                own_price,
                competitor_price,
                agency: row.agency.unwrap_or_default(),
            })
        })
        .collect()
}

pub(crate) fn parse_channel_configs<R: Read>(
    reader: R,
) -> Result<Vec<ChannelConfig>, DatasetLoadError> {
    let dataset = Dataset::ChannelConfig;
    read_rows::<_, ChannelConfigRow>(reader, dataset, CHANNEL_CONFIG_COLUMNS)?
        .into_iter()
        .map(|(line, row)| -> Result<ChannelConfig, DatasetLoadError> {
            let availability = row
                .availability
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|ratio| (0.0..=1.0).contains(ratio))
                .ok_or_else(|| invalid(dataset, line, "Disponibilidad", &row.availability))?;

            Ok(ChannelConfig {
                hotel: row.hotel,
                api_enabled: is_affirmative(&row.api),
                html_enabled: is_affirmative(&row.html),
                wrapper_enabled: is_affirmative(&row.wrapper),
                prepayment_active: is_affirmative(&row.prepayment),
                rate_type: row.rate_type.trim().to_string(),
                enabled_markets: row
                    .enabled_markets
                    .as_deref()
                    .map(split_markets)
                    .unwrap_or_default(),
                availability,
            })
        })
        .collect()
}

/// Reads every row, failing fast when a required header is absent. Returns each row with
/// its 1-based line number (the header is line 1).
fn read_rows<R: Read, T: DeserializeOwned>(
    reader: R,
    dataset: Dataset,
    required: &[&'static str],
) -> Result<Vec<(usize, T)>, DatasetLoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|source| DatasetLoadError::Csv { dataset, source })?
        .clone();
    if let Some(column) = required
        .iter()
        .find(|column| !headers.iter().any(|header| strip_bom(header) == **column))
    {
        return Err(DatasetLoadError::MissingColumn {
            dataset,
            column: *column,
        });
    }
    let cleaned: csv::StringRecord = headers.iter().map(strip_bom).collect();
    csv_reader.set_headers(cleaned);

    let mut rows = Vec::new();
    for (index, record) in csv_reader.deserialize::<T>().enumerate() {
        let row = record.map_err(|source| DatasetLoadError::Csv { dataset, source })?;
        rows.push((index + 2, row));
    }

    Ok(rows)
}

fn strip_bom(header: &str) -> &str {
    header.trim_start_matches('\u{feff}')
}

fn invalid(dataset: Dataset, line: usize, column: &'static str, value: &str) -> DatasetLoadError {
    DatasetLoadError::InvalidValue {
        dataset,
        line,
        column,
        value: value.to_string(),
    }
}

fn required_price(
    dataset: Dataset,
    line: usize,
    column: &'static str,
    value: &str,
) -> Result<f64, DatasetLoadError> {
    parse_price(value).ok_or_else(|| invalid(dataset, line, column, value))
}

fn optional_price(
    dataset: Dataset,
    line: usize,
    column: &'static str,
    value: Option<&str>,
) -> Result<Option<f64>, DatasetLoadError> {
    value
        .map(|raw| required_price(dataset, line, column, raw))
        .transpose()
}

fn required_date(
    dataset: Dataset,
    line: usize,
    column: &'static str,
    value: &str,
) -> Result<chrono::NaiveDate, DatasetLoadError> {
    parse_day_first_date(value).ok_or_else(|| invalid(dataset, line, column, value))
}

fn required_count(
    dataset: Dataset,
    line: usize,
    column: &'static str,
    value: &str,
) -> Result<u32, DatasetLoadError> {
    parse_count(value).ok_or_else(|| invalid(dataset, line, column, value))
}

#[derive(Debug, Deserialize)]
struct InternalRateRow {
    #[serde(rename = "Nombre_Hotel")]
    hotel: String,
    #[serde(rename = "PoS")]
    market: String,
    #[serde(rename = "PamBaseRate ($)")]
    base_rate: String,
    #[serde(rename = "contractcurrencybase_pam")]
    currency: String,
    #[serde(
        rename = "ExpBaseRate ($)",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    exp_base_rate: Option<String>,
    #[serde(
        rename = "HBGBaseRate ($)",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    hbg_base_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExternalOfferRow {
    #[serde(rename = "Nombre_Hotel")]
    hotel: String,
    #[serde(rename = "PoS")]
    market: String,
    check_in: String,
    check_out: String,
    #[serde(rename = "los")]
    stay_length: String,
    adults: String,
    children: String,
    #[serde(
        rename = "price_despegar (USD)",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    own_price: Option<String>,
    #[serde(
        rename = "buyers_best_price_competitor_total (USD)",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    competitor_price: Option<String>,
    #[serde(rename = "agency_name", default, deserialize_with = "empty_string_as_none")]
    agency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChannelConfigRow {
    #[serde(rename = "Hotel")]
    hotel: String,
    #[serde(rename = "Api_Tildado")]
    api: String,
    #[serde(rename = "HTML_Tildado")]
    html: String,
    #[serde(rename = "availableWrapper")]
    wrapper: String,
    #[serde(rename = "PrepagoActivo")]
    prepayment: String,
    #[serde(rename = "Rate_type")]
    rate_type: String,
    #[serde(rename = "Pos_Tildado", default, deserialize_with = "empty_string_as_none")]
    enabled_markets: Option<String>,
    #[serde(rename = "Disponibilidad")]
    availability: String,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Cursor;

    #[test]
    fn internal_rates_strip_thousands_separators() {
        let csv = "Nombre_Hotel,PoS,PamBaseRate ($),contractcurrencybase_pam,ExpBaseRate ($)\n\
Hotel Sol,AR,\"1,250.00\",USD,\"1,300.5\"\n\
Hotel Sol,BR,980,BRL,\n";
        let rates = parse_internal_rates(Cursor::new(csv)).expect("rates parse");

        assert_eq!(rates.len(), 2);
        assert_eq!(rates[0].contracted_rate, 1250.0);
        assert_eq!(rates[0].exp_base_rate, Some(1300.5));
        assert_eq!(rates[1].currency, "BRL");
        assert_eq!(rates[1].exp_base_rate, None);
        assert_eq!(rates[1].hbg_base_rate, None);
    }

    #[test]
    fn external_offers_parse_day_first_dates_and_blank_prices() {
        let csv = "Nombre_Hotel,PoS,check_in,check_out,los,adults,children,price_despegar (USD),buyers_best_price_competitor_total (USD),agency_name\n\
Hotel Sol,AR,05/03/2024,08/03/2024,3,2,1,300,330,Agency One\n\
Hotel Sol,AR,06/03/2024,07/03/2024,1,2,0,,120,\n";
        let offers = parse_external_offers(Cursor::new(csv)).expect("offers parse");

        assert_eq!(
            offers[0].check_in,
            NaiveDate::from_ymd_opt(2024, 3, 5).expect("valid date")
        );
        assert_eq!(offers[0].stay_length, 3);
        assert_eq!(offers[0].children, 1);
        assert_eq!(offers[1].own_price, None);
        assert_eq!(offers[1].agency, "");
    }

    #[test]
    fn missing_required_column_is_reported() {
        let csv = "Nombre_Hotel,PoS,PamBaseRate ($)\nHotel Sol,AR,100\n";
        let error = parse_internal_rates(Cursor::new(csv)).expect_err("missing currency");

        match error {
            DatasetLoadError::MissingColumn { dataset, column } => {
                assert_eq!(dataset, Dataset::InternalRates);
                assert_eq!(column, "contractcurrencybase_pam");
            }
            other => panic!("expected missing column, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_dates_carry_their_line_number() {
        let csv = "Nombre_Hotel,PoS,check_in,check_out,los,adults,children,price_despegar (USD),buyers_best_price_competitor_total (USD),agency_name\n\
Hotel Sol,AR,05/03/2024,08/03/2024,3,2,1,300,330,Agency One\n\
Hotel Sol,AR,tomorrow,08/03/2024,3,2,1,300,330,Agency One\n";
        let error = parse_external_offers(Cursor::new(csv)).expect_err("bad date");

        match error {
            DatasetLoadError::InvalidValue {
                line,
                column,
                value,
                ..
            } => {
                assert_eq!(line, 3);
                assert_eq!(column, "check_in");
                assert_eq!(value, "tomorrow");
            }
            other => panic!("expected invalid value, got {other:?}"),
        }
    }

    #[test]
    fn channel_config_reads_flags_and_markets() {
        let csv = "Hotel,Api_Tildado,HTML_Tildado,availableWrapper,PrepagoActivo,Rate_type,Pos_Tildado,Disponibilidad\n\
Hotel Sol,Sí,No,1,Si,PACKAGE,\"AR, BR, MX\",0.95\n\
Hotel Luna,No,No,0,No,STANDALONE,,0.4\n";
        let configs = parse_channel_configs(Cursor::new(csv)).expect("configs parse");

        assert!(configs[0].api_enabled);
        assert!(!configs[0].html_enabled);
        assert!(configs[0].wrapper_enabled);
        assert!(configs[0].prepayment_active);
        assert_eq!(configs[0].enabled_markets, vec!["AR", "BR", "MX"]);
        assert!(configs[1].enabled_markets.is_empty());
        assert_eq!(configs[1].rate_type, "STANDALONE");
    }

    #[test]
    fn availability_outside_unit_interval_is_rejected() {
        let csv = "Hotel,Api_Tildado,HTML_Tildado,availableWrapper,PrepagoActivo,Rate_type,Pos_Tildado,Disponibilidad\n\
Hotel Sol,Sí,Sí,1,Sí,PACKAGE,AR,95\n";
        let error = parse_channel_configs(Cursor::new(csv)).expect_err("ratio out of range");
        assert!(matches!(
            error,
            DatasetLoadError::InvalidValue {
                column: "Disponibilidad",
                ..
            }
        ));
    }
}
