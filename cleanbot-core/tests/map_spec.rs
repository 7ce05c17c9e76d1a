use cleanbot_core::map::{parse, MapError, MapFormat};
use cleanbot_core::models::*;
use cleanbot_core::simulation::run;
use speculate2::speculate;

speculate! {
    describe "text maps" {
        it "parses a rectangular grid of o and x" {
            let grid = parse(b"oox\nooo\nxoo", MapFormat::Text).expect("Failed to parse");

            assert_eq!(grid.width(), 3);
            assert_eq!(grid.height(), 3);
            assert_eq!(grid.cell(Position::new(2, 0)), Some(Cell::Obstacle));
            assert_eq!(grid.cell(Position::new(0, 2)), Some(Cell::Obstacle));
            assert_eq!(grid.cell(Position::new(1, 1)), Some(Cell::Free));
            assert_eq!(grid.obstacle_count(), 2);
        }

        it "accepts CRLF line endings and surrounding blank lines" {
            let grid = parse(b"\r\noo\r\nox\r\n\r\n", MapFormat::Text).expect("Failed to parse");

            assert_eq!((grid.width(), grid.height()), (2, 2));
            assert!(grid.is_free(Position::new(1, 0)));
            assert!(!grid.is_free(Position::new(1, 1)));
        }

        it "rejects rows of differing lengths" {
            let err = parse(b"ooo\noo\nooo", MapFormat::Text).unwrap_err();
            assert_eq!(err, MapError::InconsistentRow { line: 2, expected: 3, actual: 2 });
        }

        it "rejects unknown markers with their location" {
            let err = parse(b"ooo\no#o", MapFormat::Text).unwrap_err();
            assert_eq!(err, MapError::UnknownMarker { marker: '#', line: 2, column: 2 });
        }

        it "rejects empty input" {
            assert_eq!(parse(b"", MapFormat::Text), Err(MapError::Empty));
            assert_eq!(parse(b" \n\n ", MapFormat::Text), Err(MapError::Empty));
        }

        it "ignores whitespace-only lines around the grid" {
            let grid = parse(b"  \n\nooo\nooo\n  \n\t\n", MapFormat::Text).expect("Failed to parse");
            assert_eq!((grid.width(), grid.height()), (3, 2));
        }

        it "reports error lines relative to the whole file" {
            let err = parse(b"\n\nooo\noo", MapFormat::Text).unwrap_err();
            assert_eq!(err, MapError::InconsistentRow { line: 4, expected: 3, actual: 2 });
        }

        it "rejects bytes that are not UTF-8" {
            assert_eq!(parse(&[0x6f, 0xff, 0x6f], MapFormat::Text), Err(MapError::InvalidUtf8));
        }
    }

    describe "json maps" {
        it "parses width, height and obstacles" {
            let raw = br#"{"width": 4, "height": 2, "obstacles": [{"x": 3, "y": 1}]}"#;
            let grid = parse(raw, MapFormat::Json).expect("Failed to parse");

            assert_eq!((grid.width(), grid.height()), (4, 2));
            assert_eq!(grid.cell(Position::new(3, 1)), Some(Cell::Obstacle));
            assert_eq!(grid.obstacle_count(), 1);
        }

        it "accepts the rows, cols and tiles form" {
            let raw = br#"{
                "rows": 2,
                "cols": 3,
                "tiles": [
                    {"x": 0, "y": 0, "walkable": true},
                    {"x": 1, "y": 0, "walkable": false},
                    {"x": 2, "y": 1, "walkable": false}
                ]
            }"#;
            let grid = parse(raw, MapFormat::Json).expect("Failed to parse");

            assert_eq!((grid.width(), grid.height()), (3, 2));
            assert!(grid.is_free(Position::new(0, 0)));
            assert!(!grid.is_free(Position::new(1, 0)));
            assert!(!grid.is_free(Position::new(2, 1)));
            assert_eq!(grid.summary().free_cells, 1);
        }

        it "blocks cells missing from the tiles list" {
            let raw = br#"{"rows": 2, "cols": 2, "tiles": [{"x": 0, "y": 0, "walkable": true}]}"#;
            let grid = parse(raw, MapFormat::Json).expect("Failed to parse");

            assert_eq!(grid.summary().free_cells, 1);
            let result = run(&grid, Position::new(0, 0), &[Move::new(Direction::East, 1)], false)
                .expect("Run failed");
            assert_eq!(result.status, CleaningStatus::AbortedObstacle);
            assert_eq!(result.cleaned, vec![Position::new(0, 0)]);
        }

        it "treats unlisted cells as free without a tiles list" {
            let grid = parse(br#"{"width": 2, "height": 2}"#, MapFormat::Json).expect("Failed to parse");
            assert_eq!(grid, Grid::open(2, 2));
        }

        it "rejects obstacles outside the declared dimensions" {
            let raw = br#"{"width": 2, "height": 2, "obstacles": [{"x": 2, "y": 0}]}"#;
            let err = parse(raw, MapFormat::Json).unwrap_err();
            assert_eq!(err, MapError::CellOutOfRange { x: 2, y: 0, width: 2, height: 2 });
        }

        it "rejects zero dimensions" {
            let err = parse(br#"{"width": 0, "height": 3}"#, MapFormat::Json).unwrap_err();
            assert_eq!(err, MapError::InvalidDimensions { width: 0, height: 3 });
        }

        it "rejects malformed JSON" {
            let err = parse(br#"{"width": 2, "height": "#, MapFormat::Json).unwrap_err();
            assert!(matches!(err, MapError::InvalidJson(_)));
        }

        it "rejects negative coordinates" {
            let raw = br#"{"width": 2, "height": 2, "obstacles": [{"x": -1, "y": 0}]}"#;
            assert!(matches!(parse(raw, MapFormat::Json), Err(MapError::InvalidJson(_))));
        }
    }
}
