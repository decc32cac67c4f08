/*!
# Integration Tests for the PHP Obfuscator

Runs the full pipeline over a small Laravel-shaped project and checks the
decoded results.
*/

use php_obfuscator::transform::AliasStyle;
use php_obfuscator::{
    decode_envelope, DebugDisablingConfig, ObfuscationEvent, ObfuscatorConfig, ObfuscatorService,
    RenameMap,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const CONTROLLER: &str = r#"<?php

namespace App\Http\Controllers;

use App\Models\Post;

/**
 * Lists posts.
 */
class PostController extends Controller
{
    // Entry point
    public function index($request)
    {
        $posts = Post::all();
        $title = 'Posts'; # page title
        $counter = count($posts);
        return view('posts.index', compact('posts', 'title'));
    }

    private function format($counter)
    {
        return "Total: $counter";
    }
}
"#;

const COMPONENT: &str = r#"<?php

namespace App\Livewire;

use Livewire\Component;

class Counter extends Component
{
    public $count = 0;
    private $secret = 'x';

    public function increment()
    {
        $this->count++;
        $this->bump();
    }

    private function bump()
    {
        $counter = $this->secret;
        return $counter;
    }

    public function updatedCount()
    {
    }

    public function render()
    {
        return view('livewire.counter');
    }
}
"#;

const MODEL: &str = r#"<?php

namespace App\Models;

class Post extends Model
{
    protected $fillable = ['title'];
    private $draft = false;

    public function isDraft()
    {
        return $this->draft;
    }
}
"#;

const KERNEL: &str = "<?php\n// kernel\nclass Kernel { private $x; }\n";
const BROKEN: &str = "<?php\nfunction broken( {\n";
const VIEW: &str = "<div><!-- note -->{{-- secret --}}<p>{{ $title }}</p></div>\n";

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn project() -> TempDir {
    let root = TempDir::new().unwrap();
    write(root.path(), "app/Http/Controllers/PostController.php", CONTROLLER);
    write(root.path(), "app/Livewire/Counter.php", COMPONENT);
    write(root.path(), "app/Models/Post.php", MODEL);
    write(root.path(), "app/Http/Kernel.php", KERNEL);
    write(root.path(), "app/Broken.php", BROKEN);
    write(root.path(), "routes/web.php", "<?php\n$router = app('router');\n");
    write(root.path(), "resources/views/posts/index.blade.php", VIEW);
    root
}

fn service() -> ObfuscatorService {
    let config = ObfuscatorConfig {
        unicode_names: false,
        ..ObfuscatorConfig::default()
    };
    ObfuscatorService::with_rename_map(config, RenameMap::with_seed(AliasStyle::Hex, 7)).unwrap()
}

fn decoded(root: &Path, relative: &str) -> String {
    let content = fs::read_to_string(root.join(relative)).unwrap();
    decode_envelope(&content).unwrap().to_source_file()
}

#[test]
fn test_full_run_totals_and_events() {
    let root = project();
    let mut service = service();
    let mut events = Vec::new();
    let stats = service
        .obfuscate(root.path(), |event| events.push(event.clone()))
        .unwrap();

    assert_eq!(stats.files_processed, 4);
    assert_eq!(stats.files_skipped, 2);
    assert_eq!(stats.parse_failures, 1);
    assert_eq!(stats.candidates(), 6);
    assert_eq!(stats.views_cleaned, 1);
    assert_eq!(stats.encryption_key, service.encryption_key().as_str());
    assert_eq!(stats.variables_obfuscated, service.rename_map().len());

    let skipped: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ObfuscationEvent::Skip { path, .. } => {
                path.file_name().map(|n| n.to_string_lossy().into_owned())
            }
            _ => None,
        })
        .collect();
    assert_eq!(skipped, vec!["Broken.php", "Kernel.php"]);

    // Untouched files
    assert_eq!(fs::read_to_string(root.path().join("app/Http/Kernel.php")).unwrap(), KERNEL);
    assert_eq!(fs::read_to_string(root.path().join("app/Broken.php")).unwrap(), BROKEN);
}

#[test]
fn test_every_envelope_uses_run_key() {
    let root = project();
    let mut service = service();
    let stats = service.obfuscate(root.path(), |_| {}).unwrap();

    for relative in [
        "app/Http/Controllers/PostController.php",
        "app/Livewire/Counter.php",
        "app/Models/Post.php",
        "routes/web.php",
    ] {
        let content = fs::read_to_string(root.path().join(relative)).unwrap();
        assert!(content.starts_with("<?php error_reporting(0);"), "{}", relative);
        assert!(content.ends_with("eval($_r);"), "{}", relative);
        let envelope = decode_envelope(&content).unwrap();
        assert_eq!(envelope.key.as_str(), stats.encryption_key);
    }
}

#[test]
fn test_decoded_controller() {
    let root = project();
    let mut service = service();
    service.obfuscate(root.path(), |_| {}).unwrap();
    let map = service.rename_map();
    let source = decoded(root.path(), "app/Http/Controllers/PostController.php");

    // Comments are gone
    assert!(!source.contains("Lists posts"));
    assert!(!source.contains("Entry point"));
    assert!(!source.contains("page title"));

    // compact() became a literal array; bundled variables keep their names
    assert!(source.contains("view('posts.index', ['posts' => $posts, 'title' => $title])"));
    assert!(source.contains("$posts = Post::all();"));
    assert!(map.get("posts").is_none());

    // Protected variable
    assert!(source.contains("public function index($request)"));

    // Renamed variable and private method
    let counter = map.get("counter").unwrap();
    assert!(source.contains(&format!("${} = count($posts);", counter)));
    assert!(source.contains(&format!("\"Total: ${}\"", counter)));
    let format = map.get("format").unwrap();
    assert!(source.contains(&format!("private function {}(${})", format, counter)));
}

#[test]
fn test_decoded_component_and_model() {
    let root = project();
    let mut service = service();
    service.obfuscate(root.path(), |_| {}).unwrap();
    let map = service.rename_map();

    let component = decoded(root.path(), "app/Livewire/Counter.php");
    assert!(component.contains("public $count = 0;"));
    assert!(component.contains("$this->count++;"));
    assert!(component.contains("public function updatedCount()"));
    assert!(component.contains("public function render()"));
    let secret = map.get("secret").unwrap();
    let bump = map.get("bump").unwrap();
    assert!(component.contains(&format!("private ${} = 'x';", secret)));
    assert!(component.contains(&format!("$this->{}();", bump)));
    assert!(component.contains(&format!("private function {}()", bump)));

    // `$counter` got one alias for the whole run
    let counter = map.get("counter").unwrap();
    assert!(component.contains(&format!("${} = $this->{};", counter, secret)));

    let model = decoded(root.path(), "app/Models/Post.php");
    assert!(model.contains("protected $fillable = ['title'];"));
    let draft = map.get("draft").unwrap();
    assert!(model.contains(&format!("return $this->{};", draft)));
}

#[test]
fn test_backup_holds_originals() {
    let root = project();
    let mut service = service();
    let stats = service.obfuscate(root.path(), |_| {}).unwrap();

    let backup = stats.backup_path.unwrap();
    assert!(backup
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("BACKUP_"));
    assert_eq!(
        fs::read_to_string(backup.join("app/Models/Post.php")).unwrap(),
        MODEL
    );
    assert_eq!(
        fs::read_to_string(backup.join("resources/views/posts/index.blade.php")).unwrap(),
        VIEW
    );
}

#[test]
fn test_views_cleaned() {
    let root = project();
    service().obfuscate(root.path(), |_| {}).unwrap();
    assert_eq!(
        fs::read_to_string(root.path().join("resources/views/posts/index.blade.php")).unwrap(),
        "<div><p>{{ $title }}</p></div>\n"
    );
}

#[test]
fn test_toggles_disable_backup_views_and_preamble() {
    let root = project();
    let config = ObfuscatorConfig {
        clean_blade_views: false,
        debug_disabling: DebugDisablingConfig::disabled(),
        backup: php_obfuscator::BackupConfig {
            enabled: false,
            ..Default::default()
        },
        ..ObfuscatorConfig::default()
    };
    let stats = ObfuscatorService::new(config)
        .unwrap()
        .obfuscate(root.path(), |_| {})
        .unwrap();

    assert!(stats.backup_path.is_none());
    assert_eq!(stats.views_cleaned, 0);
    let entries: Vec<_> = fs::read_dir(root.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(entries.iter().all(|name| !name.starts_with("BACKUP_")));
    assert_eq!(
        fs::read_to_string(root.path().join("resources/views/posts/index.blade.php")).unwrap(),
        VIEW
    );
    let route = fs::read_to_string(root.path().join("routes/web.php")).unwrap();
    assert!(route.starts_with("<?php $_k=\""));
}

#[test]
fn test_unicode_aliases_are_confusables() {
    let root = project();
    let mut service = ObfuscatorService::new(ObfuscatorConfig::default()).unwrap();
    service.obfuscate(root.path(), |_| {}).unwrap();

    let alias = service.rename_map().get("router").unwrap().to_string();
    let length = alias.chars().count();
    assert!((4..=6).contains(&length), "{}", alias);
    assert!(alias
        .chars()
        .all(|c| php_obfuscator::transform::CONFUSABLE_CHARACTERS.contains(&c)
            || php_obfuscator::transform::CONFUSABLE_CHARACTERS
                .contains(&c.to_ascii_uppercase())));
    let route = decoded(root.path(), "routes/web.php");
    assert_eq!(route, format!("<?php\n${} = app('router');\n", alias));
}

#[test]
fn test_dry_run_plan() {
    let root = project();
    let plan = service().plan(root.path()).unwrap();
    assert_eq!(plan.files.len(), 6);
    // Broken.php cannot be detected without parsing; only exclusions are skipped
    assert_eq!(plan.skip_count(), 1);
    assert_eq!(plan.views.len(), 1);
    assert_eq!(
        fs::read_to_string(root.path().join("app/Models/Post.php")).unwrap(),
        MODEL
    );
}
