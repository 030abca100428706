//! Observer page served at `/`.
//!
//! The page listens on `/events`, renders one section per dump, and posts
//! to `/continue` and `/stop`. Dump content is inserted as text, never as
//! markup, so it shows exactly as formatted.

/// Complete HTML document for the observer UI.
pub const OBSERVER_PAGE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>runstop</title>
  <style>
    :root {
      --bg: #ffffff;
      --fg: #111111;
      --muted: #777777;
      --panel: #f3f3f3;
      --accent: #0a66c2;
      --danger: #b42318;
    }
    @media (prefers-color-scheme: dark) {
      :root {
        --bg: #161616;
        --fg: #e4e4e4;
        --muted: #8a8a8a;
        --panel: #242424;
        --accent: #3b8eea;
        --danger: #e5484d;
      }
    }
    * { box-sizing: border-box; margin: 0; padding: 0; }
    body {
      background: var(--bg);
      color: var(--fg);
      font-family: ui-monospace, SFMono-Regular, Menlo, monospace;
      line-height: 1.5;
      padding: 20px;
    }
    header {
      align-items: center;
      border-bottom: 1px solid var(--muted);
      display: flex;
      gap: 12px;
      margin-bottom: 20px;
      padding-bottom: 12px;
      position: sticky;
      top: 0;
      background: var(--bg);
    }
    h1 { font-size: 1.4em; margin-right: 8px; }
    button {
      border: none;
      border-radius: 4px;
      color: #ffffff;
      cursor: pointer;
      font-family: inherit;
      font-size: 1em;
      padding: 8px 18px;
    }
    button:hover { opacity: 0.85; }
    button:disabled { cursor: not-allowed; opacity: 0.45; }
    #run { background: var(--accent); }
    #detach { background: var(--danger); }
    #status, .timestamp { color: var(--muted); font-size: 0.9em; }
    section {
      border: 1px solid var(--muted);
      margin: 16px 0;
      padding: 12px;
    }
    h2 { font-size: 1.1em; margin-bottom: 4px; }
    pre {
      background: var(--panel);
      border-radius: 4px;
      margin-top: 8px;
      overflow-x: auto;
      padding: 12px;
      white-space: pre;
    }
  </style>
</head>
<body>
  <header>
    <h1>runstop</h1>
    <button id="run" disabled>Run</button>
    <button id="detach">Detach</button>
    <span id="status">Connecting...</span>
  </header>
  <main id="dumps"></main>

  <script>
    const runButton = document.getElementById('run');
    const detachButton = document.getElementById('detach');
    const statusLine = document.getElementById('status');
    const dumps = document.getElementById('dumps');
    let lastIndex = 0;
    let stopped = false;

    function paused() {
      runButton.disabled = false;
      statusLine.textContent = 'Paused - inspect the values and press Run to continue';
    }

    function finish() {
      stopped = true;
      runButton.disabled = true;
      detachButton.disabled = true;
      statusLine.textContent = 'Detached - the program now runs without stopping';
    }

    runButton.addEventListener('click', () => {
      runButton.disabled = true;
      statusLine.textContent = 'Running...';
      fetch('/continue', { method: 'POST' });
    });

    detachButton.addEventListener('click', () => {
      runButton.disabled = true;
      detachButton.disabled = true;
      statusLine.textContent = 'Detaching...';
      fetch('/stop', { method: 'POST' });
    });

    const events = new EventSource('/events');

    events.addEventListener('dump', (event) => {
      const dump = JSON.parse(event.data);
      if (dump.index <= lastIndex) {
        return;
      }
      lastIndex = dump.index;

      const section = document.createElement('section');
      const title = document.createElement('h2');
      title.textContent = 'Dump #' + dump.index;
      const stamp = document.createElement('p');
      stamp.className = 'timestamp';
      stamp.textContent = dump.timestamp;
      const pre = document.createElement('pre');
      const code = document.createElement('code');
      code.textContent = dump.content;
      pre.appendChild(code);
      section.append(title, stamp, pre);
      dumps.appendChild(section);

      paused();
      section.scrollIntoView({ behavior: 'smooth', block: 'start' });
    });

    events.addEventListener('ready', () => {
      if (lastIndex > 0) {
        paused();
      } else {
        runButton.disabled = true;
        statusLine.textContent = 'Connected - waiting for the first checkpoint...';
      }
    });

    events.addEventListener('stopped', () => {
      finish();
      events.close();
    });

    events.onerror = () => {
      if (!stopped) {
        runButton.disabled = true;
        statusLine.textContent = 'Disconnected - retrying...';
      }
    };
  </script>
</body>
</html>
"##;
