use std::collections::BTreeMap;

use anyhow::Result;
use serde_json::json;

use av_catalog::domain::ExtractionBatch;
use av_catalog::pipeline::processing::normalize::FieldNormalizer;
use av_catalog::pipeline::CatalogPipeline;
use av_catalog::taxonomy::Taxonomy;

fn batch_from_json(value: serde_json::Value) -> ExtractionBatch {
    serde_json::from_value(value).expect("batch should deserialize")
}

#[test]
fn duplicate_observations_fold_into_one_catalog_entry() -> Result<()> {
    let taxonomy = Taxonomy::builtin();
    let pipeline = CatalogPipeline::new(&taxonomy);

    let batch = batch_from_json(json!({
        "Paramount Theatre": [
            {
                "manufacturer": "Shure",
                "model": "SM58",
                "quantity": 6,
                "equipment_type": "microphone",
                "category": "sound",
                "venue": "Paramount Theatre",
                "specifications": {"impedance": "150 ohms"},
                "source_document": "tech_rider_2023.pdf",
                "confidence_score": 0.85
            },
            {
                "manufacturer": "SHURE",
                "model": "sm58",
                "quantity": 4,
                "equipment_type": "mic",
                "category": "",
                "venue": "Paramount Theatre",
                "specifications": {"impedance": "300 ohms"},
                "source_document": "stage_specs.pdf",
                "confidence_score": 0.6
            }
        ]
    }));

    let run = pipeline.run(batch);
    let entries = &run.catalog["Paramount Theatre"];
    assert_eq!(entries.len(), 1);

    let entry = &entries[0];
    assert_eq!(entry.id, "shure_sm58_paramount_theatre");
    assert_eq!(entry.manufacturer, "Shure");
    assert_eq!(entry.quantity, 10);
    assert_eq!(entry.confidence_score, 0.85);
    assert_eq!(entry.source_documents.len(), 2);
    // Later observation wins the specification-key collision.
    assert_eq!(
        entry.specifications.get("impedance").map(String::as_str),
        Some("300 ohms")
    );
    assert!(run.report["Paramount Theatre"].is_empty());
    Ok(())
}

#[test]
fn specification_units_are_canonicalized_end_to_end() -> Result<()> {
    let taxonomy = Taxonomy::builtin();
    let pipeline = CatalogPipeline::new(&taxonomy);

    let batch = batch_from_json(json!({
        "X": [{
            "manufacturer": "QSC",
            "model": "K12.2",
            "quantity": 2,
            "equipment_type": "speaker",
            "category": "sound",
            "venue": "X",
            "specifications": {
                "Wattage": "1.5kW",
                "Power Draw": "2200W",
                "Weight": "10 lbs",
                "Frequency Response": "50Hz - 20kHz"
            },
            "source_document": "specs.pdf",
            "confidence_score": 0.9
        }]
    }));

    let run = pipeline.run(batch);
    let specs = &run.catalog["X"][0].specifications;
    // "Wattage" and "Power Draw" both fold to "power"; the map kept one.
    let power = specs.get("power").expect("power key should exist");
    assert!(power == "1500.0W" || power == "2200.0W");
    assert_eq!(specs.get("weight").map(String::as_str), Some("4.5kg"));
    assert_eq!(
        specs.get("frequency_response").map(String::as_str),
        Some("50Hz - 20000Hz")
    );
    Ok(())
}

#[test]
fn category_is_inferred_from_equipment_type_keywords() -> Result<()> {
    let taxonomy = Taxonomy::builtin();
    let pipeline = CatalogPipeline::new(&taxonomy);

    let batch = batch_from_json(json!({
        "X": [{
            "manufacturer": "Martin",
            "model": "MAC Aura",
            "quantity": 12,
            "equipment_type": "LED Moving Head Wash",
            "category": "",
            "venue": "X",
            "source_document": "lighting_plot.pdf",
            "confidence_score": 0.75
        }]
    }));

    let run = pipeline.run(batch);
    assert_eq!(run.catalog["X"][0].category, "lighting");
    Ok(())
}

#[test]
fn validator_reports_every_violated_rule_per_record() -> Result<()> {
    let taxonomy = Taxonomy::builtin();
    let pipeline = CatalogPipeline::new(&taxonomy);

    // Manufacturer resolves to Unknown, quantity missing, confidence low:
    // exactly three issues for the single record.
    let batch = batch_from_json(json!({
        "X": [{
            "manufacturer": "",
            "model": "Mystery-1000",
            "quantity": "a few",
            "equipment_type": "fog machine",
            "category": "",
            "venue": "X",
            "source_document": "notes.txt",
            "confidence_score": 0.2
        }]
    }));

    let run = pipeline.run(batch);
    let messages = &run.report["X"];
    assert_eq!(messages.len(), 3);
    assert!(messages[0].contains("Missing manufacturer"));
    assert!(messages[1].contains("Invalid quantity"));
    assert!(messages[2].contains("Low confidence score (0.2)"));
    Ok(())
}

#[test]
fn standardized_fields_are_fixed_points_of_normalization() -> Result<()> {
    let taxonomy = Taxonomy::builtin();
    let pipeline = CatalogPipeline::new(&taxonomy);
    let normalizer = FieldNormalizer::new(&taxonomy);

    let batch = batch_from_json(json!({
        "X": [{
            "manufacturer": "yamaha corporation",
            "model": "Model QL5 Series",
            "quantity": 1,
            "equipment_type": "mixing console",
            "category": "audio",
            "venue": "X",
            "source_document": "audio_specs.pdf",
            "confidence_score": 0.9
        }]
    }));

    let run = pipeline.run(batch);
    let entry = &run.catalog["X"][0];

    assert_eq!(
        normalizer.normalize_manufacturer(&entry.manufacturer),
        entry.manufacturer
    );
    assert_eq!(normalizer.normalize_model(&entry.model), entry.model);
    assert_eq!(
        normalizer.normalize_category(&entry.category, &entry.equipment_type),
        entry.category
    );
    assert_eq!(
        normalizer.normalize_equipment_type(&entry.equipment_type, &entry.category),
        entry.equipment_type
    );
    Ok(())
}

#[test]
fn untrusted_input_shapes_do_not_abort_the_batch() -> Result<()> {
    let taxonomy = Taxonomy::builtin();
    let pipeline = CatalogPipeline::new(&taxonomy);

    let batch = batch_from_json(json!({
        "Empty Venue": [],
        "Messy Venue": [
            {"venue": "Messy Venue", "quantity": 2},
            {
                "manufacturer": "Shure",
                "model": "SM58",
                "quantity": -3,
                "equipment_type": "mic",
                "category": "nonsense",
                "venue": "Messy Venue",
                "source_document": "scan.pdf",
                "confidence_score": 1.7
            }
        ]
    }));

    let run = pipeline.run(batch);
    assert!(run.catalog["Empty Venue"].is_empty());

    // The field-less record is kept with sentinel fields and flagged; the
    // negative-quantity one is flagged rather than corrected.
    let entries = &run.catalog["Messy Venue"];
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].manufacturer, "Unknown");
    assert_eq!(entries[0].model, "Unknown");
    assert_eq!(entries[0].quantity, 2);
    assert_eq!(entries[1].quantity, -3);
    assert_eq!(entries[1].confidence_score, 1.7);
    let messages = &run.report["Messy Venue"];
    assert!(messages.iter().any(|m| m.contains("Missing manufacturer")));
    assert!(messages.iter().any(|m| m.contains("Missing model")));
    assert!(messages.iter().any(|m| m.contains("Invalid quantity")));
    Ok(())
}

#[test]
fn notes_preserve_a_trail_for_every_decision() -> Result<()> {
    let taxonomy = Taxonomy::builtin();
    let pipeline = CatalogPipeline::new(&taxonomy);

    let batch = batch_from_json(json!({
        "X": [{
            "manufacturer": "Shure Incorporated",
            "model": "SM58",
            "quantity": 2,
            "equipment_type": "wireless mic",
            "category": "",
            "venue": "X",
            "source_document": "rider.pdf",
            "confidence_score": 0.9
        }]
    }));

    let run = pipeline.run(batch);
    let notes = run.catalog["X"][0].standardization_notes.join("\n");
    assert!(notes.contains("Manufacturer normalized: Shure Incorporated -> Shure"));
    assert!(notes.contains("Equipment type normalized: wireless mic -> Wireless Microphone"));
    Ok(())
}

#[test]
fn operator_taxonomy_file_drives_the_same_pipeline() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("taxonomy.toml");
    std::fs::write(
        &path,
        r#"
        [categories]
        lighting = ["light", "led"]
        sound = ["audio", "mic", "speaker"]
        video = ["video", "projector"]

        [manufacturers]
        "meyer sound" = ["meyer sound", "meyer"]

        [equipment_types.sound]
        "speaker" = "Speaker"

        [spec_keys]
        power = ["power", "wattage"]
        "#,
    )?;

    let taxonomy = Taxonomy::load(&path)?;
    let pipeline = CatalogPipeline::new(&taxonomy);

    let batch = batch_from_json(json!({
        "X": [{
            "manufacturer": "Meyer",
            "model": "X-40",
            "quantity": 2,
            "equipment_type": "speaker",
            "category": "sound",
            "venue": "X",
            "source_document": "specs.pdf",
            "confidence_score": 0.9
        }]
    }));

    let run = pipeline.run(batch);
    assert_eq!(run.catalog["X"][0].manufacturer, "Meyer Sound");
    assert_eq!(run.catalog["X"][0].equipment_type, "Speaker");
    Ok(())
}

#[test]
fn venue_order_and_record_order_are_stable() -> Result<()> {
    let taxonomy = Taxonomy::builtin();
    let pipeline = CatalogPipeline::new(&taxonomy);

    let records = json!([
        {
            "manufacturer": "Yamaha", "model": "QL5", "quantity": 1,
            "equipment_type": "mixer", "category": "sound", "venue": "X",
            "source_document": "a.pdf", "confidence_score": 0.9
        },
        {
            "manufacturer": "Shure", "model": "SM58", "quantity": 2,
            "equipment_type": "mic", "category": "sound", "venue": "X",
            "source_document": "a.pdf", "confidence_score": 0.9
        },
        {
            "manufacturer": "Yamaha", "model": "QL5", "quantity": 1,
            "equipment_type": "mixer", "category": "sound", "venue": "X",
            "source_document": "b.pdf", "confidence_score": 0.9
        }
    ]);
    let batch = batch_from_json(json!({"X": records}));

    let run = pipeline.run(batch);
    let ids: Vec<&str> = run.catalog["X"].iter().map(|r| r.id.as_str()).collect();
    // First occurrence pins the position; the later duplicate only enriched it.
    assert_eq!(ids, vec!["yamaha_ql5_x", "shure_sm58_x"]);
    assert_eq!(run.catalog["X"][0].quantity, 2);
    Ok(())
}

#[test]
fn report_and_catalog_share_the_venue_key_set() -> Result<()> {
    let taxonomy = Taxonomy::builtin();
    let pipeline = CatalogPipeline::new(&taxonomy);

    let batch: ExtractionBatch = BTreeMap::from([
        ("A".to_string(), Vec::new()),
        ("B".to_string(), Vec::new()),
    ]);
    let run = pipeline.run(batch);
    assert_eq!(
        run.catalog.keys().collect::<Vec<_>>(),
        run.report.keys().collect::<Vec<_>>()
    );
    Ok(())
}
