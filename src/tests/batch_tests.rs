use crate::{
    BatchMode, BatchOutput, Dataset, Deviation, Field, FieldValue, Sheet, SheetError, Variable,
};

fn rows() -> Dataset {
    Dataset::from_rows(&[[0.5, 1.0, 0.1], [0.3, 2.0, 0.15]]).unwrap()
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-7,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn test_rows_in_input_order() {
    let mut sheet = Sheet::with_equation("a*x**3").unwrap();
    sheet.set_error("a", 0.05).unwrap();

    let output = sheet.batch(&rows(), "a|x|x%", BatchMode::Default).unwrap();
    let pairs = output.pairs();
    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[0].0, 0.5);
    assert_close(pairs[0].1, 0.158113883);
    assert_eq!(pairs[1].0, 2.4);
    assert_close(pairs[1].1, 0.6720119);
}

#[test]
fn test_exact_mode_rounds() {
    let mut sheet = Sheet::with_equation("a*x**3").unwrap();
    sheet.set_error("a", 0.05).unwrap();
    let output = sheet.batch(&rows(), "a|x|x%", BatchMode::Exact).unwrap();
    assert_eq!(output, BatchOutput::Pairs(vec![(0.5, 0.16), (2.4, 0.67)]));
}

#[test]
fn test_constants_apply_to_every_row() {
    let mut sheet = Sheet::with_equation("a*x**3").unwrap();
    sheet.set_value("a", 1.0, 0.05).unwrap();

    let output = sheet.batch(&rows(), "*|x|x%", BatchMode::Measurement).unwrap();
    let BatchOutput::Measurements(values) = output else {
        panic!("expected measurements");
    };
    assert_eq!(values[0].nominal, 1.0);
    assert_close(values[0].uncertainty, 0.0925f64.sqrt());
    assert_eq!(values[1].nominal, 8.0);
    assert_close(values[1].uncertainty, 3.4f64.sqrt());
    assert_eq!(sheet.get("a", Field::Value), Some(FieldValue::Value(1.0)));
}

#[test]
fn test_column_count_checked_first() {
    let mut sheet = Sheet::with_equation("a*x").unwrap();
    assert_eq!(
        sheet.batch(&rows(), "a|x", BatchMode::Default),
        Err(SheetError::Shape {
            columns: 3,
            fields: 2
        })
    );
    assert!(sheet.registry().is_empty());
}

#[test]
fn test_mapping_errors() {
    let mut sheet = Sheet::with_equation("a*x").unwrap();
    assert!(matches!(
        sheet.batch(&rows(), "a| |x%", BatchMode::Default),
        Err(SheetError::FieldMapping { .. })
    ));
    assert!(matches!(
        "fancy".parse::<BatchMode>(),
        Err(SheetError::UnsupportedMode { .. })
    ));

    let mut empty = Sheet::new();
    assert_eq!(
        empty.batch(&rows(), "a|x|x%", BatchMode::Default),
        Err(SheetError::NoEquation)
    );
}

#[test]
fn test_single_column_and_labels() {
    let mut sheet = Sheet::with_equation("2*t").unwrap();
    sheet
        .set_variable("t", Variable::new().deviation(0.5).label(r"t_{\mathrm{fall}}"))
        .unwrap();

    let data = Dataset::from_column(&[1.0, 2.0, 3.0]);
    let output = sheet.batch(&data, "t", BatchMode::Default).unwrap();
    assert_eq!(output.pairs(), vec![(2.0, 1.0), (4.0, 1.0), (6.0, 1.0)]);
    assert_eq!(
        sheet.get("t", Field::Label),
        Some(FieldValue::Label(r"t_{\mathrm{fall}}".to_string()))
    );
    assert_eq!(
        sheet.get("t", Field::Deviation),
        Some(FieldValue::Deviation(Deviation::Known(0.5)))
    );
}

#[test]
fn test_columns_are_stacked() {
    let mut sheet = Sheet::with_equation("x + y").unwrap();
    let data = Dataset::from_columns(&[vec![1.0, 2.0], vec![0.3, 0.4], vec![3.0, 4.0], vec![0.4, 0.3]])
        .unwrap();
    let pairs = sheet.batch(&data, "x|x%|y|y%", BatchMode::Default).unwrap().pairs();
    assert_eq!(pairs[0].0, 4.0);
    assert_close(pairs[0].1, 0.5);
    assert_eq!(pairs[1].0, 6.0);
    assert_close(pairs[1].1, 0.5);
}

#[test]
fn test_batch_reuses_error_formula() {
    let mut sheet = Sheet::with_equation("a*x**3").unwrap();
    sheet.set_error("a", 0.05).unwrap();
    sheet.set_error("x", 0.1).unwrap();
    sheet.set_value("a", 0.5, 0.05).unwrap();
    sheet.set_value("x", 1.0, 0.1).unwrap();
    sheet.run().unwrap();
    let id = sheet.error_expr().unwrap().id;

    sheet.batch(&rows(), "a|x|x%", BatchMode::Default).unwrap();
    assert_eq!(sheet.error_expr().unwrap().id, id);
}

#[test]
fn test_empty_dataset_gives_empty_output() {
    let mut sheet = Sheet::with_equation("a*x**3").unwrap();
    sheet.set_error("a", 0.05).unwrap();
    let empty: Vec<Vec<f64>> = Vec::new();
    let data = Dataset::from_rows(&empty).unwrap();

    let output = sheet.batch(&data, "a|x|x%", BatchMode::Default).unwrap();
    assert!(output.is_empty());
    let output = sheet.batch(&data, "a|x|x%", BatchMode::Measurement).unwrap();
    assert_eq!(output, BatchOutput::Measurements(Vec::new()));

    let mut blank = Sheet::new();
    assert_eq!(
        blank.batch(&data, "a|x", BatchMode::Default),
        Err(SheetError::NoEquation)
    );
}

#[test]
fn test_missing_value_warns_once_per_batch() {
    let mut sheet = Sheet::with_equation("a*x").unwrap();
    let data = Dataset::from_rows(&[[1.0, 0.1], [2.0, 0.2], [3.0, 0.3], [4.0, 0.4]]).unwrap();

    let output = sheet.batch(&data, "x|x%", BatchMode::Default).unwrap();
    assert_eq!(output.pairs(), vec![(0.0, 0.0); 4]);
    // One nominal and one deviation warning, not one per row
    assert_eq!(sheet.messages().warnings().count(), 2);
}
