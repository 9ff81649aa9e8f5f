//! Overview and detail parser tests: strategy fallback, row filtering,
//! normalization.

mod common;

use mtg_metagame::models::{CardEntry, DeckStub};
use mtg_metagame::parse::{
    normalize_card_name, parse_percent, parse_quantity, slugify, DeckDetailParser, DetailLayout,
    DetailStrategy, OverviewParser, OverviewStrategy,
};

fn stub() -> DeckStub {
    DeckStub {
        name: "Test Deck".into(),
        meta_share_percent: 10.0,
        detail_ref: "/archetype/test".into(),
        rank: 1,
    }
}

fn names(cards: &[CardEntry]) -> Vec<&str> {
    cards.iter().map(|c| c.name.as_str()).collect()
}

// ---------------------------------------------------------------------------
// normalize_card_name
// ---------------------------------------------------------------------------

#[test]
fn normalize_trims_and_collapses_whitespace() {
    assert_eq!(normalize_card_name("  Lightning \t  Bolt \n"), "Lightning Bolt");
    assert_eq!(normalize_card_name("Sheoldred,\u{a0}the Apocalypse"), "Sheoldred, the Apocalypse");
}

#[test]
fn normalize_folds_curly_quotes() {
    assert_eq!(normalize_card_name("Urabrask\u{2019}s Forge"), "Urabrask's Forge");
    assert_eq!(normalize_card_name("Urabrask\u{2018}s Forge"), "Urabrask's Forge");
    assert_eq!(normalize_card_name("Urabrask`s Forge"), "Urabrask's Forge");
}

#[test]
fn normalize_is_idempotent() {
    let inputs = [
        "",
        "   ",
        "Lightning Bolt",
        "  Kumano  Faces\tKakkazan ",
        "Urabrask\u{2019}s\u{a0}\u{a0}Forge",
        "\u{201C}Ach! Hans, Run!\u{201D}",
        "Fire // Ice",
        "Lim-D\u{fb}l\u{2019}s Vault",
    ];
    for input in inputs {
        let once = normalize_card_name(input);
        assert_eq!(normalize_card_name(&once), once, "input {:?}", input);
    }
}

// ---------------------------------------------------------------------------
// slugify / field parsing
// ---------------------------------------------------------------------------

#[test]
fn slugify_lowercases_and_hyphenates() {
    assert_eq!(slugify("Mono Red Aggro", 1), "mono-red-aggro");
    assert_eq!(slugify("  Izzet   Phoenix ", 1), "izzet-phoenix");
    assert_eq!(slugify("Rakdos (Sacrifice)!", 1), "rakdos-sacrifice");
    assert_eq!(slugify("Boros-Convoke", 1), "boros-convoke");
    assert_eq!(slugify("Urza's Saga Combo", 1), "urzas-saga-combo");
}

#[test]
fn slugify_falls_back_to_rank() {
    assert_eq!(slugify("!!!", 7), "deck-7");
    assert_eq!(slugify("", 2), "deck-2");
}

#[test]
fn parse_percent_variants() {
    assert_eq!(parse_percent("15.8%"), Some(15.8));
    assert_eq!(parse_percent(" 15,8 % "), Some(15.8));
    assert_eq!(parse_percent("12.3% (45)"), Some(12.3));
    assert_eq!(parse_percent("Share: 7%"), Some(7.0));
    assert_eq!(parse_percent("3.5"), Some(3.5));
    assert_eq!(parse_percent("n/a"), None);
    assert_eq!(parse_percent("Mono Red Aggro"), None);
    assert_eq!(parse_percent("%"), None);
    assert_eq!(parse_percent("120%"), None);
}

#[test]
fn parse_quantity_variants() {
    assert_eq!(parse_quantity("4"), Some(4));
    assert_eq!(parse_quantity(" 4x "), Some(4));
    assert_eq!(parse_quantity("x2"), Some(2));
    assert_eq!(parse_quantity("0"), None);
    assert_eq!(parse_quantity("-1"), None);
    assert_eq!(parse_quantity("four"), None);
    assert_eq!(parse_quantity(""), None);
}

// ---------------------------------------------------------------------------
// OverviewParser
// ---------------------------------------------------------------------------

#[test]
fn overview_single_well_formed_row() {
    let html = common::overview_html(&[("Mono Red Aggro", "15.8%", "/archetype/x")]);
    let stubs = OverviewParser::new().parse(&html);
    assert_eq!(stubs.len(), 1);
    assert_eq!(stubs[0].name, "Mono Red Aggro");
    assert_eq!(stubs[0].meta_share_percent, 15.8);
    assert_eq!(stubs[0].detail_ref, "/archetype/x");
    assert_eq!(stubs[0].rank, 1);
}

#[test]
fn overview_skips_rows_missing_fields_and_ranks_by_output_order() {
    let html = r#"<html><body><table class="metagame-table"><tbody>
        <tr><td class="deck-name"><a href="/a">Alpha</a></td><td class="meta-share">10%</td></tr>
        <tr><td class="deck-name"><a href="/b">Beta</a></td><td class="meta-share">n/a</td></tr>
        <tr><td class="deck-name"><a>Gamma</a></td><td class="meta-share">5%</td></tr>
        <tr><td class="deck-name"><a href="/d">Delta</a></td><td class="meta-share">4.5%</td></tr>
    </tbody></table></body></html>"#;
    let stubs = OverviewParser::new().parse(html);
    let got: Vec<(&str, u32)> = stubs.iter().map(|s| (s.name.as_str(), s.rank)).collect();
    assert_eq!(got, vec![("Alpha", 1), ("Delta", 2)]);
}

#[test]
fn overview_falls_back_to_tile_layout() {
    let html = r#"<html><body><div class="archetype-tiles">
        <div class="archetype-tile">
          <div class="archetype-tile-title"><a href="/archetype/rakdos">Rakdos Midrange</a></div>
          <div class="metagame-percentage"><div class="archetype-tile-statistic-value">11.2%</div></div>
        </div>
        <div class="archetype-tile">
          <div class="archetype-tile-title"><a href="/archetype/esper">Esper Legends</a></div>
          <div class="metagame-percentage"><div class="archetype-tile-statistic-value">8%</div></div>
        </div>
    </div></body></html>"#;
    let stubs = OverviewParser::new().parse(html);
    assert_eq!(stubs.len(), 2);
    assert_eq!(stubs[0].name, "Rakdos Midrange");
    assert_eq!(stubs[0].meta_share_percent, 11.2);
    assert_eq!(stubs[1].detail_ref, "/archetype/esper");
    assert_eq!(stubs[1].rank, 2);
}

#[test]
fn overview_falls_back_to_generic_table() {
    let html = r#"<html><body><table>
        <tr><th>Deck</th><th>Share</th></tr>
        <tr><td><a href="/deck/1">Gruul Prowess</a></td><td>Tier 1</td><td>6.0%</td></tr>
    </table></body></html>"#;
    let stubs = OverviewParser::new().parse(html);
    assert_eq!(stubs.len(), 1);
    assert_eq!(stubs[0].name, "Gruul Prowess");
    assert_eq!(stubs[0].meta_share_percent, 6.0);
}

#[test]
fn overview_generic_table_prefers_percent_cell_over_rank() {
    let html = r#"<html><body><table>
        <tr><th>#</th><th>Deck</th><th>Share</th></tr>
        <tr><td>1</td><td><a href="/deck/1">Mono Red Aggro</a></td><td>15.8%</td></tr>
        <tr><td>2</td><td><a href="/deck/2">Esper Legends</a></td><td>7,4 %</td></tr>
    </table></body></html>"#;
    let stubs = OverviewParser::new().parse(html);
    assert_eq!(stubs.len(), 2);
    assert_eq!(stubs[0].name, "Mono Red Aggro");
    assert_eq!(stubs[0].meta_share_percent, 15.8);
    assert_eq!(stubs[0].rank, 1);
    assert_eq!(stubs[1].meta_share_percent, 7.4);
}

#[test]
fn overview_generic_table_accepts_bare_share_without_percent_cells() {
    let html = r#"<html><body><table>
        <tr><td><a href="/deck/1">Gruul Prowess</a></td><td>6.5</td></tr>
    </table></body></html>"#;
    let stubs = OverviewParser::new().parse(html);
    assert_eq!(stubs.len(), 1);
    assert_eq!(stubs[0].meta_share_percent, 6.5);
}

#[test]
fn overview_first_yielding_strategy_wins() {
    // Both the primary table and a generic table are present; only the
    // primary one is read.
    let html = r#"<html><body>
        <table><tr><td><a href="/other">Other</a></td><td>50%</td></tr></table>
        <table class="metagame-table"><tbody>
          <tr><td class="deck-name"><a href="/a">Alpha</a></td><td class="meta-share">10%</td></tr>
        </tbody></table>
    </body></html>"#;
    let stubs = OverviewParser::new().parse(html);
    assert_eq!(stubs.len(), 1);
    assert_eq!(stubs[0].name, "Alpha");
}

#[test]
fn overview_malformed_input_yields_empty() {
    let parser = OverviewParser::new();
    assert!(parser.parse("").is_empty());
    assert!(parser.parse("<<<not html at all").is_empty());
    assert!(parser.parse("<table class=\"metagame-table\"><tbody></tbody>").is_empty());
}

#[test]
fn overview_invalid_strategy_selector_is_skipped() {
    let parser = OverviewParser::with_strategies(vec![
        OverviewStrategy {
            name: "broken",
            container: "table[[",
            row: "tr",
            deck_name: "a",
            share: "td",
            link: "a",
        },
        OverviewStrategy::defaults().remove(0),
    ]);
    let html = common::overview_html(&[("Alpha", "3%", "/a")]);
    assert_eq!(parser.parse(&html).len(), 1);
}

// ---------------------------------------------------------------------------
// DeckDetailParser
// ---------------------------------------------------------------------------

#[test]
fn detail_single_table_splits_sideboard() {
    let html = common::detail_html(
        &[(20, "Mountain"), (4, "Lightning Bolt")],
        &[(2, "Abrade"), (1, "Roiling Vortex")],
    );
    let deck = DeckDetailParser::new().parse(&html, &stub());
    assert_eq!(names(&deck.mainboard), vec!["Mountain", "Lightning Bolt"]);
    assert_eq!(deck.mainboard[0].quantity, 20);
    assert_eq!(names(&deck.sideboard), vec!["Abrade", "Roiling Vortex"]);
}

#[test]
fn detail_drops_rows_without_quantity_or_name() {
    let html = r#"<html><body><table class="deck-view-deck-table">
        <tr><td class="deck-col-qty">4</td><td class="deck-col-card"><a>Lightning Bolt</a></td></tr>
        <tr><td class="deck-col-qty">0</td><td class="deck-col-card"><a>Shock</a></td></tr>
        <tr><td class="deck-col-qty">x</td><td class="deck-col-card"><a>Play with Fire</a></td></tr>
        <tr><td class="deck-col-qty">3</td><td class="deck-col-card">   </td></tr>
        <tr><td class="deck-col-card"><a>Abrade</a></td></tr>
    </table></body></html>"#;
    let deck = DeckDetailParser::new().parse(html, &stub());
    assert_eq!(names(&deck.mainboard), vec!["Lightning Bolt"]);
    assert!(deck.sideboard.is_empty());
}

#[test]
fn detail_merges_duplicate_names() {
    let html = common::detail_html(
        &[(2, "Lightning Bolt"), (20, "Mountain"), (2, "Lightning  Bolt")],
        &[],
    );
    let deck = DeckDetailParser::new().parse(&html, &stub());
    assert_eq!(names(&deck.mainboard), vec!["Lightning Bolt", "Mountain"]);
    assert_eq!(deck.mainboard[0].quantity, 4);
}

#[test]
fn detail_normalizes_card_names() {
    let html = common::detail_html(&[(4, "Urabrask\u{2019}s   Forge")], &[]);
    let deck = DeckDetailParser::new().parse(&html, &stub());
    assert_eq!(deck.mainboard[0].name, "Urabrask's Forge");
}

#[test]
fn detail_falls_back_to_split_tables() {
    let html = r#"<html><body>
        <div class="mainboard"><table>
          <tr><td>4</td><td>Memory Deluge</td></tr>
          <tr><td>8</td><td>Island</td></tr>
        </table></div>
        <div class="sideboard"><table>
          <tr><td>3</td><td>Negate</td></tr>
        </table></div>
    </body></html>"#;
    let deck = DeckDetailParser::new().parse(html, &stub());
    assert_eq!(names(&deck.mainboard), vec!["Memory Deluge", "Island"]);
    assert_eq!(names(&deck.sideboard), vec!["Negate"]);
}

#[test]
fn detail_falls_back_to_text_export() {
    let html = "<html><body><textarea class=\"decklist\">4 Lightning Bolt\n20 Mountain\n\n2 Abrade\nSB: 1 Roiling Vortex\n</textarea></body></html>";
    let deck = DeckDetailParser::new().parse(html, &stub());
    assert_eq!(names(&deck.mainboard), vec!["Lightning Bolt", "Mountain"]);
    assert_eq!(names(&deck.sideboard), vec!["Abrade", "Roiling Vortex"]);
}

#[test]
fn detail_text_export_with_headers() {
    let html = "<html><body><pre class=\"decklist\">Deck\n4x Sunfall\n7 Plains\nSideboard\n3 Negate</pre></body></html>";
    let deck = DeckDetailParser::new().parse(html, &stub());
    assert_eq!(names(&deck.mainboard), vec!["Sunfall", "Plains"]);
    assert_eq!(names(&deck.sideboard), vec!["Negate"]);
}

#[test]
fn detail_first_yielding_strategy_wins() {
    let table = common::detail_html(&[(4, "Lightning Bolt")], &[]);
    let html = table.replace(
        "</body>",
        "<textarea class=\"decklist\">4 Counterspell</textarea></body>",
    );
    let deck = DeckDetailParser::new().parse(&html, &stub());
    assert_eq!(names(&deck.mainboard), vec!["Lightning Bolt"]);
}

#[test]
fn detail_unrecognised_page_yields_empty_deck() {
    let deck = DeckDetailParser::new().parse("<html><body><p>404</p></body></html>", &stub());
    assert!(deck.is_empty());
}

#[test]
fn detail_custom_strategy_list() {
    let parser = DeckDetailParser::with_strategies(vec![DetailStrategy {
        name: "list-items",
        layout: DetailLayout::SplitTables {
            mainboard: "ul.main",
            sideboard: "ul.side",
            row: "li",
            quantity: "span.n",
            card: "span.card",
        },
    }]);
    let html = r#"<ul class="main"><li><span class="n">4</span><span class="card">Opt</span></li></ul>"#;
    let deck = parser.parse(html, &stub());
    assert_eq!(names(&deck.mainboard), vec!["Opt"]);
}
