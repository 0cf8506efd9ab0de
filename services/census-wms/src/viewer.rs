//! The interactive map viewer page.
//!
//! A single self-contained OpenLayers page over the XYZ tile endpoints.
//! Popup state lives server-side; the page calls the overlay API on click
//! and renders whatever state comes back.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

/// GET / - OpenLayers viewer
pub async fn viewer_handler() -> impl IntoResponse {
    let html = r##"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Uganda Census Map</title>
    <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/ol@v9.2.4/ol.css">
    <style>
        html, body { margin: 0; height: 100%; font-family: system-ui, sans-serif; }
        #map { width: 100%; height: 100%; }
        #controls {
            position: absolute; top: 10px; right: 10px; z-index: 10;
            background: rgba(255, 255, 255, 0.92); padding: 10px 14px;
            border-radius: 4px; box-shadow: 0 1px 4px rgba(0,0,0,0.3);
        }
        #controls label { display: block; margin: 4px 0; cursor: pointer; }
        #legend {
            position: absolute; bottom: 24px; right: 10px; z-index: 10;
            background: rgba(255, 255, 255, 0.92); padding: 10px 14px;
            border-radius: 4px; box-shadow: 0 1px 4px rgba(0,0,0,0.3);
            font-size: 13px;
        }
        #legend .legend-row { display: flex; align-items: center; margin: 2px 0; }
        #legend .swatch {
            display: inline-block; width: 14px; height: 14px;
            margin-right: 6px; border: 1px solid #999;
        }
        #popup {
            background: white; padding: 10px 14px; border-radius: 4px;
            box-shadow: 0 1px 4px rgba(0,0,0,0.3); min-width: 200px;
            font-size: 13px;
        }
        #popup p { margin: 3px 0; }
        #popup-closer {
            position: absolute; top: 2px; right: 8px; cursor: pointer;
            text-decoration: none; color: #666;
        }
    </style>
</head>
<body>
    <div id="map"></div>
    <div id="controls">
        <label><input type="radio" name="base" value="osm" checked> OpenStreetMap</label>
        <label><input type="radio" name="base" value="satellite"> Satellite</label>
        <hr>
        <label><input type="radio" name="style" value="population" checked> Population density</label>
        <label><input type="radio" name="style" value="growth"> Growth rate</label>
        <label><input type="checkbox" id="boundaries" checked> District boundaries</label>
    </div>
    <div id="legend">Loading legend&hellip;</div>
    <div id="popup"><a href="#" id="popup-closer">&times;</a><div id="popup-content"></div></div>
    <script src="https://cdn.jsdelivr.net/npm/ol@v9.2.4/dist/ol.js"></script>
    <script>
        const tileLayer = (layer, style) => new ol.layer.Tile({
            source: new ol.source.XYZ({
                url: '/tiles/' + layer + '/' + style + '/{z}/{x}/{y}.png',
            }),
        });

        const osm = new ol.layer.Tile({ source: new ol.source.OSM() });
        const satellite = new ol.layer.Tile({
            source: new ol.source.XYZ({
                url: 'https://mt1.google.com/vt/lyrs=s&x={x}&y={y}&z={z}',
            }),
            visible: false,
        });

        const population = tileLayer('districts', 'population');
        const growth = tileLayer('districts', 'growth');
        growth.setVisible(false);
        const boundaries = tileLayer('district-boundaries', 'default');

        const popupEl = document.getElementById('popup');
        const popup = new ol.Overlay({
            element: popupEl,
            autoPan: { animation: { duration: 150 } },
            positioning: 'bottom-center',
            offset: [0, -8],
        });

        const map = new ol.Map({
            target: 'map',
            layers: [osm, satellite, population, growth, boundaries],
            overlays: [popup],
            controls: ol.control.defaults.defaults().extend([new ol.control.ZoomSlider()]),
            view: new ol.View({
                center: ol.proj.fromLonLat([32.1391, 1.453]),
                zoom: 7,
            }),
        });

        function renderOverlay(state) {
            if (state.shown && state.anchor) {
                document.getElementById('popup-content').innerHTML = state.content;
                popup.setPosition(ol.proj.fromLonLat([state.anchor.lon, state.anchor.lat]));
            } else {
                popup.setPosition(undefined);
            }
        }

        map.on('singleclick', evt => {
            const [lon, lat] = ol.proj.toLonLat(evt.coordinate);
            fetch('/api/overlay/click', {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify({ lon, lat }),
            })
                .then(r => r.json())
                .then(data => renderOverlay(data.overlay))
                .catch(() => {});
        });

        document.getElementById('popup-closer').addEventListener('click', evt => {
            evt.preventDefault();
            fetch('/api/overlay/close', { method: 'POST' })
                .then(r => r.json())
                .then(renderOverlay)
                .catch(() => {});
        });

        function loadLegend(style) {
            const params = new URLSearchParams({
                SERVICE: 'WMS',
                REQUEST: 'GetLegendGraphic',
                LAYER: 'districts',
                STYLE: style,
                FORMAT: 'text/html',
            });
            fetch('/wms?' + params)
                .then(r => r.text())
                .then(html => { document.getElementById('legend').innerHTML = html; })
                .catch(() => {});
        }

        document.querySelectorAll('input[name="base"]').forEach(input => {
            input.addEventListener('change', () => {
                osm.setVisible(input.value === 'osm');
                satellite.setVisible(input.value === 'satellite');
            });
        });

        document.querySelectorAll('input[name="style"]').forEach(input => {
            input.addEventListener('change', () => {
                const style = input.value;
                population.setVisible(style === 'population');
                growth.setVisible(style === 'growth');
                loadLegend(style);
            });
        });

        document.getElementById('boundaries').addEventListener('change', evt => {
            boundaries.setVisible(evt.target.checked);
        });

        // Restore any popup still shown server-side, then the legend
        fetch('/api/overlay').then(r => r.json()).then(renderOverlay).catch(() => {});
        loadLegend('population');
    </script>
</body>
</html>"##;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/html")
        .body(axum::body::Body::from(html))
        .unwrap()
}
