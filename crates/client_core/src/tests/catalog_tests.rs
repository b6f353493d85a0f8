use super::*;
use crate::fake_api::FakeApi;

fn loader(api: FakeApi) -> (CatalogLoader, Arc<FakeApi>) {
    let api = Arc::new(api);
    (CatalogLoader::new(api.clone()), api)
}

fn labels(control: &SelectControl) -> Vec<&str> {
    control
        .options()
        .iter()
        .map(|option| option.label.as_str())
        .collect()
}

#[test]
fn new_control_holds_only_the_default_option() {
    let control = SelectControl::new(FilterField::Sector);
    assert_eq!(control.options(), [FilterOption::any()]);
    assert_eq!(control.values().count(), 0);
}

#[test]
fn populate_keeps_default_first_and_dedupes() {
    let mut control = SelectControl::new(FilterField::Sector);
    control.populate(
        ["Sociedad", "Agricultura", "", "Sociedad", "  Pesca "]
            .into_iter()
            .map(String::from),
    );
    assert_eq!(labels(&control), vec!["Todos", "Sociedad", "Agricultura", "Pesca"]);
    assert!(control.contains("Pesca"));
    assert!(!control.contains("Todos"));
}

#[test]
fn repopulating_replaces_previous_values() {
    let mut control = SelectControl::new(FilterField::Organo);
    control.populate(vec!["A".to_string(), "B".to_string()]);
    control.populate(vec!["C".to_string()]);
    assert_eq!(labels(&control), vec!["Todos", "C"]);
}

#[tokio::test]
async fn load_requests_every_category_once() {
    let (loader, api) = loader(
        FakeApi::default()
            .with_values(FilterField::Organo, &["Ministerio de Cultura"])
            .with_values(FilterField::TipoConvocatoria, &["Concurrencia competitiva"])
            .with_values(FilterField::Instrumento, &["Subvención", "Préstamo"])
            .with_values(FilterField::Sector, &["Sociedad"])
            .with_values(FilterField::Finalidad, &["Cultura", "Empleo"]),
    );
    let mut controls = CatalogControls::default();

    let report = loader.load(&mut controls).await;
    assert!(report.is_complete());
    assert_eq!(report.loaded.len(), 5);

    let mut calls = api.filter_value_calls.lock().expect("lock").clone();
    calls.sort();
    assert_eq!(calls, FilterField::ALL.to_vec());

    let instrumentos = controls.get(FilterField::Instrumento).expect("control");
    assert_eq!(labels(instrumentos), vec!["Todos", "Subvención", "Préstamo"]);
}

#[tokio::test]
async fn failed_category_keeps_prior_state_and_others_load() {
    let (loader, _) = loader(
        FakeApi::default()
            .with_values(FilterField::Sector, &["Sociedad", "Industria"])
            .with_failing_values(
                FilterField::Organo,
                ClientError::Server {
                    status: 500,
                    detail: None,
                },
            )
            .with_failing_values(
                FilterField::Finalidad,
                ClientError::Network("connection refused".into()),
            ),
    );
    let mut controls = CatalogControls::default();
    controls
        .control_mut(FilterField::Organo)
        .populate(vec!["Órgano previo".to_string()]);

    let report = loader.load(&mut controls).await;
    assert!(!report.is_complete());
    let failed: Vec<FilterField> = report.failed.iter().map(|(field, _)| *field).collect();
    assert_eq!(failed, vec![FilterField::Organo, FilterField::Finalidad]);

    assert_eq!(
        labels(controls.get(FilterField::Organo).expect("organo")),
        vec!["Todos", "Órgano previo"]
    );
    assert_eq!(
        labels(controls.get(FilterField::Finalidad).expect("finalidad")),
        vec!["Todos"]
    );
    assert_eq!(
        labels(controls.get(FilterField::Sector).expect("sector")),
        vec!["Todos", "Sociedad", "Industria"]
    );
}

#[tokio::test]
async fn region_entries_become_numbered_options() {
    let api = FakeApi::default();
    *api.regions.lock().expect("lock") = Ok(vec![
        CatalogEntry {
            id: 1,
            nombre: "Andalucía".into(),
        },
        CatalogEntry {
            id: 13,
            nombre: "Madrid".into(),
        },
    ]);
    let (loader, _) = loader(api);

    let regions = loader.regions().await.expect("regions");
    assert_eq!(
        regions,
        vec![
            FilterOption::numbered(1, "Andalucía"),
            FilterOption::numbered(13, "Madrid"),
        ]
    );
    assert!(loader.areas().await.expect("areas").is_empty());
}
