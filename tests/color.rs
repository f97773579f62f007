mod tests {
    use lumen_composer::color::{
        BLACK, Rgb, WHITE, blend_colors, dim, fill_bar, hue_to_rgb, lerp_colors, parse_color,
    };

    const RED: Rgb = Rgb { r: 255, g: 0, b: 0 };
    const BLUE: Rgb = Rgb { r: 0, g: 0, b: 255 };

    #[test]
    fn test_blend_colors() {
        assert_eq!(blend_colors(RED, BLUE, 0), RED);
        assert_eq!(blend_colors(RED, BLUE, 255), BLUE);
        assert_eq!(
            blend_colors(RED, BLUE, 128),
            Rgb {
                r: 127,
                g: 0,
                b: 128
            }
        );
        assert_eq!(blend_colors(WHITE, BLACK, 255), BLACK);
    }

    #[test]
    fn test_lerp_colors_clamps() {
        assert_eq!(lerp_colors(RED, BLUE, 0.0), RED);
        assert_eq!(lerp_colors(RED, BLUE, 1.0), BLUE);
        assert_eq!(lerp_colors(RED, BLUE, -2.0), RED);
        assert_eq!(lerp_colors(RED, BLUE, 3.0), BLUE);
    }

    #[test]
    fn test_dim() {
        assert_eq!(dim(WHITE, 1.0), WHITE);
        assert_eq!(dim(WHITE, 0.0), BLACK);
        assert_eq!(dim(WHITE, 0.4), Rgb { r: 102, g: 102, b: 102 });
        assert_eq!(dim(RED, f32::NAN), BLACK);
    }

    #[test]
    fn test_hue_wraps() {
        assert_eq!(hue_to_rgb(0.0, 1.0, 1.0), RED);
        assert_eq!(hue_to_rgb(1.0, 1.0, 1.0), RED);
        assert_eq!(hue_to_rgb(0.3, 1.0, 0.0), BLACK);
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("RED"), Some(RED));
        assert_eq!(parse_color("#FF8000"), Some(Rgb { r: 255, g: 128, b: 0 }));
        assert_eq!(parse_color("#FFF"), None);
        assert_eq!(parse_color("#GGGGGG"), None);
        assert_eq!(parse_color(""), None);
    }

    #[test]
    fn test_fill_bar() {
        let mut leds = [Some(RED); 4];
        fill_bar(&mut leds, 0.0, BLACK, WHITE, 1.0);
        assert_eq!(leds, [None; 4]);

        fill_bar(&mut leds, f32::NAN, BLACK, WHITE, 1.0);
        assert_eq!(leds, [None; 4]);

        fill_bar(&mut leds, 0.25, BLUE, WHITE, 1.0);
        assert_eq!(leds, [Some(BLUE), None, None, None]);

        fill_bar(&mut leds, 1.0, BLUE, RED, 1.0);
        assert_eq!(leds[0], Some(BLUE));
        assert_eq!(leds[3], Some(RED));

        // Leading pixel dimmed by partial coverage
        fill_bar(&mut leds, 0.375, WHITE, WHITE, 1.0);
        assert_eq!(leds[0], Some(WHITE));
        let lead = leds[1].unwrap();
        assert!(lead.r > 100 && lead.r < 160, "{lead:?}");
        assert_eq!(leds[2], None);

        let mut empty: [Option<Rgb>; 0] = [];
        fill_bar(&mut empty, 1.0, BLACK, WHITE, 1.0);
    }
}
