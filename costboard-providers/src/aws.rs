//! AWS Cost Explorer (`GetCostAndUsage`) provider.
//!
//! Credentials come from the default AWS chain; only the region is ours to
//! configure.

use crate::{CostProvider, ProviderError, Result};
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use aws_sdk_costexplorer::error::DisplayErrorContext;
use aws_sdk_costexplorer::operation::get_cost_and_usage::GetCostAndUsageOutput;
use aws_sdk_costexplorer::types::{
    DateInterval, Dimension, DimensionValues, Expression, Granularity as CeGranularity,
    GroupDefinition, GroupDefinitionType,
};
use aws_sdk_costexplorer::Client;
use costboard_common::{CostFilter, CostQuery, DimensionMatch, Granularity, RawCostEntry};

/// Upper bound on `next_page_token` follow-ups for one query.
const MAX_PAGES: usize = 50;

pub struct AwsCostExplorerProvider {
    client: Client,
}

impl AwsCostExplorerProvider {
    pub async fn with_region(region: &str) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;
        Self {
            client: Client::new(&config),
        }
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CostProvider for AwsCostExplorerProvider {
    fn name(&self) -> &'static str {
        "aws"
    }

    async fn fetch_costs(&self, query: &CostQuery) -> Result<Vec<RawCostEntry>> {
        let (start, end) = query.range.to_iso_pair();
        let time_period = DateInterval::builder()
            .start(&start)
            .end(&end)
            .build()
            .map_err(|e| ProviderError::Malformed(format!("invalid time period: {}", e)))?;

        tracing::info!(
            start = %start,
            end = %end,
            granularity = query.granularity.as_str(),
            group_by = %query.group_by,
            "querying AWS Cost Explorer"
        );

        let mut entries = Vec::new();
        let mut next_page: Option<String> = None;

        for page in 0..MAX_PAGES {
            let mut request = self
                .client
                .get_cost_and_usage()
                .time_period(time_period.clone())
                .granularity(granularity(query.granularity))
                .metrics(query.metric.clone())
                .group_by(
                    GroupDefinition::builder()
                        .r#type(GroupDefinitionType::Dimension)
                        .key(query.group_by.clone())
                        .build(),
                )
                .set_next_page_token(next_page.take());

            if let Some(filter) = query.filter.as_ref().and_then(filter_expression) {
                request = request.filter(filter);
            }

            let output = request.send().await.map_err(|e| {
                ProviderError::Unavailable(format!("{}", DisplayErrorContext(&e)))
            })?;

            tracing::debug!(page, "GetCostAndUsage output: {:?}", output);

            let rows = parse_output(&output, &query.metric)
                .map_err(|e| ProviderError::Malformed(format!("{:#}", e)))?;
            entries.extend(rows);

            match output.next_page_token() {
                Some(token) if !token.is_empty() => next_page = Some(token.to_string()),
                _ => return Ok(entries),
            }
        }

        Err(ProviderError::Malformed(format!(
            "pagination did not finish after {} pages",
            MAX_PAGES
        )))
    }
}

fn granularity(granularity: Granularity) -> CeGranularity {
    match granularity {
        Granularity::Daily => CeGranularity::Daily,
        Granularity::Monthly => CeGranularity::Monthly,
    }
}

fn dimension_expression(m: &DimensionMatch) -> Expression {
    Expression::builder()
        .dimensions(
            DimensionValues::builder()
                .key(Dimension::from(m.dimension.as_str()))
                .set_values(Some(m.values.clone()))
                .build(),
        )
        .build()
}

/// Cost Explorer rejects an `And` with a single operand, so a lone clause is
/// sent as-is.
fn filter_expression(filter: &CostFilter) -> Option<Expression> {
    let mut clauses: Vec<Expression> = filter.include.iter().map(dimension_expression).collect();
    clauses.extend(
        filter
            .exclude
            .iter()
            .map(|m| Expression::builder().not(dimension_expression(m)).build()),
    );

    match clauses.len() {
        0 => None,
        1 => clauses.pop(),
        _ => Some(Expression::builder().set_and(Some(clauses)).build()),
    }
}

fn parse_output(output: &GetCostAndUsageOutput, metric: &str) -> anyhow::Result<Vec<RawCostEntry>> {
    let mut rows = Vec::new();
    for result in output.results_by_time() {
        let bucket = result
            .time_period()
            .map(|tp| tp.start().to_string())
            .context("result without time period")?;

        for group in result.groups() {
            let category = group
                .keys()
                .first()
                .cloned()
                .ok_or_else(|| anyhow!("group without key in bucket {}", bucket))?;
            let amount = group
                .metrics()
                .and_then(|metrics| metrics.get(metric))
                .and_then(|value| value.amount())
                .ok_or_else(|| anyhow!("missing {} for {} in bucket {}", metric, category, bucket))?;

            rows.push(RawCostEntry {
                bucket: bucket.clone(),
                category,
                amount: amount.to_string(),
            });
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_costexplorer::types::{Group, MetricValue, ResultByTime};

    fn result(start: &str, end: &str, groups: Vec<Group>) -> ResultByTime {
        ResultByTime::builder()
            .time_period(DateInterval::builder().start(start).end(end).build().unwrap())
            .set_groups(Some(groups))
            .build()
    }

    fn group(key: &str, amount: &str) -> Group {
        Group::builder()
            .keys(key)
            .metrics(
                "BlendedCost",
                MetricValue::builder().amount(amount).unit("USD").build(),
            )
            .build()
    }

    #[test]
    fn parses_groups_into_raw_entries() {
        let output = GetCostAndUsageOutput::builder()
            .results_by_time(result(
                "2024-01-01",
                "2024-02-01",
                vec![group("EC2", "10.5"), group("S3", "0.0000001")],
            ))
            .results_by_time(result("2024-02-01", "2024-03-01", vec![group("S3", "3.0")]))
            .build();

        let rows = parse_output(&output, "BlendedCost").unwrap();
        assert_eq!(
            rows,
            vec![
                RawCostEntry::new("2024-01-01", "EC2", "10.5"),
                RawCostEntry::new("2024-01-01", "S3", "0.0000001"),
                RawCostEntry::new("2024-02-01", "S3", "3.0"),
            ]
        );
    }

    #[test]
    fn missing_metric_is_malformed() {
        let output = GetCostAndUsageOutput::builder()
            .results_by_time(result("2024-01-01", "2024-02-01", vec![group("EC2", "1")]))
            .build();
        let err = parse_output(&output, "UnblendedCost").unwrap_err();
        assert!(err.to_string().contains("missing UnblendedCost"));
    }

    #[test]
    fn group_without_key_is_malformed() {
        let keyless = Group::builder()
            .metrics("BlendedCost", MetricValue::builder().amount("1").build())
            .build();
        let output = GetCostAndUsageOutput::builder()
            .results_by_time(result("2024-01-01", "2024-02-01", vec![keyless]))
            .build();
        assert!(parse_output(&output, "BlendedCost").is_err());
    }

    #[test]
    fn billable_usage_filter_becomes_and_expression() {
        let expr = filter_expression(&CostFilter::billable_usage()).unwrap();
        let clauses = expr.and();
        assert_eq!(clauses.len(), 2);
        assert_eq!(
            clauses[0].dimensions().map(|d| d.values().to_vec()),
            Some(vec!["Usage".to_string()])
        );
        assert!(clauses[1].not().is_some());
    }

    #[test]
    fn single_clause_is_not_wrapped() {
        let filter = CostFilter {
            include: vec![DimensionMatch::new("RECORD_TYPE", &["Usage"])],
            exclude: vec![],
        };
        let expr = filter_expression(&filter).unwrap();
        assert!(expr.and().is_empty());
        assert!(expr.dimensions().is_some());
        assert!(filter_expression(&CostFilter::default()).is_none());
    }
}
